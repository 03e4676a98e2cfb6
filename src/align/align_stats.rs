// src/align/align_stats.rs

use super::split_domains::PaddedAlignment;
use crate::domains::DomainTable;
use crate::types::{BestMatch, HmmAlignment, ReportRow, SummaryRow};

/// Columns a hit may miss at either end before it counts as truncated.
pub const END_SLACK: usize = 2;

/// Symbol the translation uses for a stop codon.
pub const STOP_SYMBOL: char = '*';

/// Flag reads whose hit stops short on the profile *and* the target at the
/// same end. Truncation on only one side is an ordinary partial read.
///
/// The trailing check needs the profile length; with an unbounded domain
/// table only the leading check applies.
pub fn has_frameshift(best_match: &BestMatch, profile_len: Option<usize>, tgt_len: usize) -> bool {
    let late_start = best_match.hmm_from > END_SLACK && best_match.tgt_from > END_SLACK;
    let early_end = profile_len.is_some_and(|len| len.saturating_sub(best_match.hmm_to) > END_SLACK)
        && tgt_len.saturating_sub(best_match.tgt_to) > END_SLACK;
    late_start || early_end
}

/// `true` if the aligned target span `[from, to)` contains a stop symbol.
pub fn has_stop_codon(tgt_seq: &str, from: usize, to: usize) -> bool {
    tgt_seq
        .chars()
        .skip(from)
        .take(to.saturating_sub(from))
        .any(|c| c == STOP_SYMBOL)
}

/// One report row: a cell per table domain (empty if never reached) plus flags.
/// A domain the read stopped inside still gets its partial cell, but the row
/// is only complete when every domain was filled.
pub fn build_report_row(aln: &HmmAlignment, padded: &PaddedAlignment, table: &DomainTable) -> ReportRow {
    let bm = &aln.best_match;
    let domains = (0..table.len())
        .map(|i| padded.domains.get(i).map(|(_, s)| s.clone()).unwrap_or_default())
        .collect();

    ReportRow {
        read: aln.seq_id.clone(),
        domains,
        complete: padded.is_complete(table),
        frameshift: has_frameshift(bm, table.profile_len(), aln.tgt_len),
        stop: has_stop_codon(&aln.tgt_seq, bm.tgt_from, bm.tgt_to),
    }
}

#[inline]
fn metric(metric: &'static str, count: usize, total: usize) -> SummaryRow {
    let fraction = if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    };
    SummaryRow {
        metric,
        fraction,
        count,
        total,
    }
}

/// Summary over every read submitted, including those that produced no
/// alignment.
pub fn build_summary(rows: &[ReportRow], failed: usize, total_reads: usize) -> Vec<SummaryRow> {
    let complete = rows.iter().filter(|r| r.complete).count();
    let frameshift = rows.iter().filter(|r| r.frameshift).count();
    let stop = rows.iter().filter(|r| r.stop).count();

    vec![
        metric("failed", failed, total_reads),
        metric("complete", complete, total_reads),
        metric("frameshift", frameshift, total_reads),
        metric("stop_codon", stop, total_reads),
    ]
}

/// Build the report rows for a batch and its summary.
pub fn build_alignment_report(
    alignments: &[HmmAlignment],
    padded: &[PaddedAlignment],
    table: &DomainTable,
    failed: usize,
    total_reads: usize,
) -> (Vec<ReportRow>, Vec<SummaryRow>) {
    let rows: Vec<ReportRow> = alignments
        .iter()
        .zip(padded)
        .map(|(aln, p)| build_report_row(aln, p, table))
        .collect();
    let summary = build_summary(&rows, failed, total_reads);

    log::info!(
        "{} of {} reads aligned ({} failed), {} complete",
        rows.len(),
        total_reads,
        failed,
        summary[1].count
    );

    (rows, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::split_domains::split_domains;
    use crate::align::test_alignment;

    fn best_match(hmm: (usize, usize), tgt: (usize, usize)) -> BestMatch {
        let mut bm = test_alignment("r", 0, "M").best_match;
        bm.hmm_from = hmm.0;
        bm.hmm_to = hmm.1;
        bm.tgt_from = tgt.0;
        bm.tgt_to = tgt.1;
        bm
    }

    #[test]
    fn test_frameshift_needs_both_sides() {
        // Late start on both profile and target.
        assert!(has_frameshift(&best_match((5, 123), (4, 120)), Some(123), 120));
        // Late start on the profile only: read simply begins inside the domain.
        assert!(!has_frameshift(&best_match((5, 123), (0, 118)), Some(123), 118));
        // Early end on both.
        assert!(has_frameshift(&best_match((0, 100), (0, 100)), Some(123), 140));
        // Early end on the profile only.
        assert!(!has_frameshift(&best_match((0, 100), (0, 100)), Some(123), 101));
        // Within the slack.
        assert!(!has_frameshift(&best_match((2, 121), (2, 110)), Some(123), 112));
    }

    #[test]
    fn test_frameshift_from_start_only_by_early_end() {
        // No late start, and the end is within the slack on at least one side.
        for (hmm_to, tgt_to, tgt_len) in [(123, 123, 123), (110, 110, 111), (121, 60, 200)] {
            assert!(!has_frameshift(&best_match((0, hmm_to), (0, tgt_to)), Some(123), tgt_len));
        }
        // Starting at the first column does not hide an early end on both sides.
        assert!(has_frameshift(&best_match((0, 100), (0, 100)), Some(123), 140));
    }

    #[test]
    fn test_frameshift_unbounded_table_skips_end_check() {
        assert!(!has_frameshift(&best_match((0, 50), (0, 50)), None, 200));
    }

    #[test]
    fn test_stop_codon_within_span_only() {
        let seq = "MA*EVQLV*S";
        assert!(has_stop_codon(seq, 0, 3));
        assert!(!has_stop_codon(seq, 3, 8));
        assert!(has_stop_codon(seq, 3, 9));
        assert!(!has_stop_codon(seq, 9, 40));
        assert!(!has_stop_codon(seq, 5, 2));
    }

    #[test]
    fn test_report_row_and_summary() {
        let table: DomainTable = "A:2,B:2,C:2".parse().unwrap();
        let full = test_alignment("full", 0, "MMMMMM");
        let short = test_alignment("short", 0, "MMM");

        let padded: Vec<PaddedAlignment> = [&full, &short].iter().map(|a| split_domains(None, a, &table)).collect();
        let (rows, summary) = build_alignment_report(&[full, short], &padded, &table, 2, 4);

        assert!(rows[0].complete);
        assert_eq!(rows[1].domains, vec!["MM".to_string(), "M".to_string(), String::new()]);
        assert!(!rows[1].complete);

        assert_eq!(summary[0], SummaryRow { metric: "failed", fraction: 0.5, count: 2, total: 4 });
        assert_eq!(summary[1], SummaryRow { metric: "complete", fraction: 0.25, count: 1, total: 4 });
        assert_eq!(summary[3].metric, "stop_codon");
    }

    #[test]
    fn test_report_row_incomplete_inside_last_domain() {
        let table = DomainTable::default();
        let aln = test_alignment("r", 0, &"M".repeat(120));
        let padded = split_domains(None, &aln, &table);
        let row = build_report_row(&aln, &padded, &table);

        assert_eq!(row.domains.len(), 7);
        assert_eq!(row.domains[6], "M".repeat(8));
        assert!(!row.complete);
    }

    #[test]
    fn test_summary_empty_batch() {
        let summary = build_summary(&[], 0, 0);
        assert!(summary.iter().all(|row| row.fraction == 0.0));
    }
}
