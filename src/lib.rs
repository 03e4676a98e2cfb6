// src/lib.rs
pub mod align;
pub mod blocks;
pub mod domains;
pub mod error;
pub mod fasta;
pub mod hmmsearch;
pub mod types;

use ahash::AHashMap;
use std::fmt::Write as FmtWrite;
use std::path::{Path, PathBuf};

use crate::align::align_stats::build_alignment_report;
use crate::align::{align_batch, PaddedAlignment, PaddingCounts};
use crate::domains::DomainTable;
use crate::error::ReadError;
use crate::fasta::{read_fasta_records, FastaRecord};
use crate::types::{FailedRead, HmmAlignment, ReadInput, ReadRecord, ReportRow, SummaryRow};

/// File name suffix of a read's report: `<reports_dir>/<target_id><suffix>`.
pub const DEFAULT_REPORT_SUFFIX: &str = "_hmmsearch.txt";

/// Run options for [`align_reads`].
#[derive(Debug, Clone)]
pub struct AlignOptions {
    /// Pad every read to the batch's widest insertion at each position.
    pub insert_padding: bool,
    pub report_suffix: String,
    /// Worker threads; 0 uses rayon's global pool.
    pub threads: usize,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            insert_padding: true,
            report_suffix: DEFAULT_REPORT_SUFFIX.to_string(),
            threads: 0,
        }
    }
}

/// Alignment results as structured data; text is generated on demand.
pub struct AlignmentResults {
    /// Successfully parsed reads, in input order
    pub alignments: Vec<HmmAlignment>,

    /// Padded per-domain rows, parallel to `alignments`
    pub padded: Vec<PaddedAlignment>,

    /// Reads that produced no alignment
    pub failures: Vec<FailedRead>,

    /// Report rows, parallel to `alignments`
    pub report_rows: Vec<ReportRow>,
    pub summary_rows: Vec<SummaryRow>,

    /// `None` when insertion padding was disabled
    pub padding_counts: Option<PaddingCounts>,

    pub domain_table: DomainTable,
}

#[inline]
fn flag(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

impl AlignmentResults {
    /// Generate the per-read domain report (tab-separated) on demand
    pub fn get_report_text(&self) -> String {
        let mut output = String::from("read");
        for name in self.domain_table.names() {
            output.push('\t');
            output.push_str(name);
        }
        output.push_str("\tcomplete?\tframeshift?\tstop?\n");

        for row in &self.report_rows {
            output.push_str(&row.read);
            for cell in &row.domains {
                output.push('\t');
                output.push_str(cell);
            }
            writeln!(
                output,
                "\t{}\t{}\t{}",
                flag(row.complete),
                flag(row.frameshift),
                flag(row.stop)
            )
            .unwrap();
        }
        output
    }

    /// Generate the summary table on demand
    pub fn get_summary_text(&self) -> String {
        let mut output = String::from("metric\tfraction\tcount\ttotal\n");
        for row in &self.summary_rows {
            writeln!(output, "{}\t{:.4}\t{}\t{}", row.metric, row.fraction, row.count, row.total).unwrap();
        }
        output
    }

    /// Generate padded rows as FASTA, one record per aligned read
    pub fn get_alignment_fasta(&self) -> String {
        let mut output = String::new();
        for (aln, padded) in self.alignments.iter().zip(&self.padded) {
            writeln!(output, ">{}", aln.seq_id).unwrap();
            output.push_str(&padded.joined());
            output.push('\n');
        }
        output
    }

    /// Generate the list of failed reads and reasons on demand
    pub fn get_failures_text(&self) -> String {
        let mut output = String::new();
        for failure in &self.failures {
            writeln!(output, "{}\t{}", failure.read_id, failure.error).unwrap();
        }
        output
    }
}

/// Align an in-memory batch. `failures` are reads already known to have no
/// usable report; they count towards the totals.
pub fn align_inputs(
    inputs: &[ReadInput],
    mut failures: Vec<FailedRead>,
    domain_table: DomainTable,
    insert_padding: bool,
) -> AlignmentResults {
    let total_reads = inputs.len() + failures.len();
    let outcome = align_batch(inputs, &domain_table, insert_padding);
    failures.extend(outcome.failures);

    let (report_rows, summary_rows) = build_alignment_report(
        &outcome.alignments,
        &outcome.padded,
        &domain_table,
        failures.len(),
        total_reads,
    );

    AlignmentResults {
        alignments: outcome.alignments,
        padded: outcome.padded,
        failures,
        report_rows,
        summary_rows,
        padding_counts: outcome.padding_counts,
        domain_table,
    }
}

/// Six-frame translation ids look like `<dna_id>:<strand>:offset_<n>`.
fn find_dna<'a>(dna: &'a AHashMap<String, String>, target_id: &str) -> Option<&'a String> {
    dna.get(target_id)
        .or_else(|| target_id.split(':').next().and_then(|base| dna.get(base)))
}

fn load_inputs(
    targets: Vec<FastaRecord>,
    dna: &AHashMap<String, String>,
    reports_dir: &Path,
    report_suffix: &str,
) -> (Vec<ReadInput>, Vec<FailedRead>) {
    let mut inputs = Vec::with_capacity(targets.len());
    let mut failures = Vec::new();

    for target in targets {
        let path: PathBuf = reports_dir.join(format!("{}{}", target.id, report_suffix));
        match std::fs::read_to_string(&path) {
            Ok(text) => inputs.push(ReadInput {
                record: ReadRecord {
                    dna_seq: find_dna(dna, &target.id).cloned().unwrap_or_default(),
                    id: target.id,
                    tgt_seq: target.seq,
                },
                report: text.lines().map(str::to_string).collect(),
            }),
            Err(source) => {
                log::warn!("{}: no report at {}", target.id, path.display());
                failures.push(FailedRead {
                    read_id: target.id,
                    error: ReadError::Report { path, source },
                });
            }
        }
    }
    (inputs, failures)
}

/// Unified function to align reads from a translated-target FASTA and a
/// directory of per-read hmmsearch reports.
pub fn align_reads(
    targets_path: &Path,
    dna_path: Option<&Path>,
    reports_dir: &Path,
    domain_table: DomainTable,
    options: &AlignOptions,
) -> Result<AlignmentResults, Box<dyn std::error::Error>> {
    // 1. Load translated targets
    let targets = read_fasta_records(targets_path)?;
    log::info!("Loaded {} targets from {}", targets.len(), targets_path.display());

    // 2. Optional DNA the targets were translated from
    let dna: AHashMap<String, String> = match dna_path {
        Some(path) => read_fasta_records(path)?
            .into_iter()
            .map(|r| (r.id, r.seq))
            .collect(),
        None => AHashMap::new(),
    };

    // 3. Pair each target with its report
    let (inputs, failures) = load_inputs(targets, &dna, reports_dir, &options.report_suffix);

    // 4. Parse, pad, split, report
    let run = || align_inputs(&inputs, failures, domain_table, options.insert_padding);
    let results = if options.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(options.threads)
            .build()?
            .install(run)
    } else {
        run()
    };

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const READ1_REPORT: &str = include_str!("../tests/fixtures/read1_hmmsearch.txt");
    const READ2_REPORT: &str = include_str!("../tests/fixtures/read2_hmmsearch.txt");

    fn write_inputs(dir: &Path) -> PathBuf {
        let targets = dir.join("reads.trans.fa");
        fs::write(
            &targets,
            ">read1:fwd:offset_0\nMAEVQLVESGGGKAVQPSGSLRLSK\n>read2\nMQPMT\n>read3\nMQ*MT\n",
        )
        .unwrap();
        fs::write(dir.join("read1:fwd:offset_0_hmmsearch.txt"), READ1_REPORT).unwrap();
        fs::write(dir.join("read2_hmmsearch.txt"), READ2_REPORT).unwrap();
        targets
    }

    #[test]
    fn test_align_reads_api() {
        let dir = tempfile::tempdir().unwrap();
        let targets = write_inputs(dir.path());
        let dna = dir.path().join("reads.fa");
        fs::write(&dna, ">read1\nATGGCC\n").unwrap();

        let table: DomainTable = "FR:10,CDR:5,rest".parse().unwrap();
        let results = align_reads(&targets, Some(&dna), dir.path(), table, &AlignOptions::default())
            .expect("alignment failed");

        assert_eq!(results.alignments.len(), 1);
        assert_eq!(results.alignments[0].dna_seq, "ATGGCC");
        assert_eq!(results.failures.len(), 2);
        assert!(results
            .failures
            .iter()
            .any(|f| f.read_id == "read3" && matches!(f.error, ReadError::Report { .. })));

        let report = results.get_report_text();
        let mut lines = report.lines();
        assert_eq!(lines.next(), Some("read\tFR\tCDR\trest\tcomplete?\tframeshift?\tstop?"));
        assert_eq!(
            lines.next(),
            Some("read1:fwd:offset_0\tEVQLVESGGG\tkaVQPS\tGSLRL\tTrue\tFalse\tFalse")
        );

        let summary = results.get_summary_text();
        assert!(summary.contains("failed\t0.6667\t2\t3"));
        assert!(summary.contains("complete\t0.3333\t1\t3"));

        assert_eq!(
            results.get_alignment_fasta(),
            ">read1:fwd:offset_0\nEVQLVESGGGkaVQPSGSLRL\n"
        );
        assert_eq!(results.get_failures_text().lines().count(), 2);
    }

    #[test]
    fn test_align_reads_dedicated_pool() {
        let dir = tempfile::tempdir().unwrap();
        let targets = write_inputs(dir.path());
        let options = AlignOptions {
            insert_padding: false,
            threads: 2,
            ..AlignOptions::default()
        };
        let results = align_reads(&targets, None, dir.path(), DomainTable::default(), &options).unwrap();

        assert!(results.padding_counts.is_none());
        // 20 profile columns cannot reach every heavy-chain domain.
        assert!(!results.report_rows[0].complete);
        assert_eq!(results.report_rows[0].domains.len(), 7);
    }

    #[test]
    fn test_align_reads_missing_targets_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.fa");
        assert!(align_reads(&missing, None, dir.path(), DomainTable::default(), &AlignOptions::default()).is_err());
    }
}
