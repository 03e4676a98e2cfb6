use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use absequious_rs::domains::{parse_domain_table, DomainTable};
use absequious_rs::{align_reads, AlignOptions, DEFAULT_REPORT_SUFFIX};

/// Split hmmsearch alignments of translated reads into padded framework/CDR columns.
#[derive(Parser, Debug)]
#[command(name = "absequious-rs", version, about, long_about = None)]
struct Args {
    /// Translated target FASTA (.fa or .fa.gz); ids match the hmmsearch target names
    #[arg(short, long)]
    targets: PathBuf,

    /// Directory holding one hmmsearch report per target
    #[arg(short, long)]
    reports: PathBuf,

    /// DNA FASTA the targets were translated from
    #[arg(long)]
    dna: Option<PathBuf>,

    /// Prefix for the output files
    #[arg(short, long, default_value = "absequious")]
    out_prefix: String,

    /// Domain table as NAME:LEN,NAME:LEN,... (default: heavy chain)
    #[arg(long, conflicts_with = "domain_file")]
    domains: Option<String>,

    /// Domain table file, one `name<TAB>length` per line
    #[arg(long)]
    domain_file: Option<PathBuf>,

    /// Do not pad insertions across reads
    #[arg(long)]
    no_padding: bool,

    /// Report file suffix after the target id
    #[arg(long, default_value = DEFAULT_REPORT_SUFFIX)]
    report_suffix: String,

    /// Number of threads (0 = all cores)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Increase logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn spinner(color: &str, message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template(&format!("{{spinner:.{color}}} {{msg}}"))
            .expect("Invalid spinner template"),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn output_path(prefix: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}{suffix}"))
}

fn load_domain_table(args: &Args) -> Result<DomainTable, Box<dyn std::error::Error>> {
    Ok(match (&args.domains, &args.domain_file) {
        (Some(spec), _) => spec.parse()?,
        (None, Some(path)) => parse_domain_table(path)?,
        (None, None) => DomainTable::default(),
    })
}

fn write_output(path: &Path, text: String) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(path, text).map_err(|e| format!("Could not write {}: {e}", path.display()))?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp(None)
        .init();

    let domain_table = load_domain_table(&args)?;
    log::info!("Domain table: {}", domain_table);

    let options = AlignOptions {
        insert_padding: !args.no_padding,
        report_suffix: args.report_suffix.clone(),
        threads: args.threads,
    };

    // 1. Parse, pad and split
    let progress = spinner("green", "Aligning reads...");
    let results = align_reads(
        &args.targets,
        args.dna.as_deref(),
        &args.reports,
        domain_table,
        &options,
    )?;
    progress.finish_with_message(format!(
        "Aligned {} read(s), {} failed.",
        results.alignments.len(),
        results.failures.len()
    ));

    // 2. Write outputs
    let progress = spinner("yellow", "Writing output files...");
    write_output(&output_path(&args.out_prefix, ".tsv"), results.get_report_text())?;
    write_output(&output_path(&args.out_prefix, ".summary.tsv"), results.get_summary_text())?;
    write_output(&output_path(&args.out_prefix, ".aln.fa"), results.get_alignment_fasta())?;
    if !results.failures.is_empty() {
        write_output(&output_path(&args.out_prefix, ".failed.tsv"), results.get_failures_text())?;
    }
    progress.finish_with_message("Output files created.");

    print!("{}", results.get_summary_text());
    Ok(())
}
