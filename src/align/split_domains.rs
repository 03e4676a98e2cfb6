// src/align/split_domains.rs

use super::insert_padding::PaddingCounts;
use crate::domains::{Domain, DomainTable};
use crate::types::{AlnState, HmmAlignment};

/// Padded per-domain rows of one read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaddedAlignment {
    /// `(domain_name, padded_row)` for every domain the read reached, in
    /// table order. The last entry may be a domain the read stopped inside.
    pub domains: Vec<(String, String)>,
    /// Leading entries of `domains` that were filled to their full length.
    pub closed: usize,
}

impl PaddedAlignment {
    /// `true` when the read filled every domain of `table`.
    pub fn is_complete(&self, table: &DomainTable) -> bool {
        self.closed >= table.len()
    }

    /// All domain rows joined into one padded row.
    pub fn joined(&self) -> String {
        self.domains.iter().map(|(_, s)| s.as_str()).collect()
    }
}

/// Walks the domain table while characters are written: the open domain,
/// how many profile columns it still takes, and what it holds so far.
struct DomainCursor<'t> {
    domains: &'t [Domain],
    index: usize,
    remaining: Option<usize>,
    /// A column was charged to the open domain.
    filled: bool,
    current: String,
    rows: Vec<(String, String)>,
}

impl<'t> DomainCursor<'t> {
    fn new(table: &'t DomainTable) -> Self {
        let mut cursor = Self {
            domains: table.domains(),
            index: 0,
            remaining: None,
            filled: false,
            current: String::new(),
            rows: Vec::with_capacity(table.len()),
        };
        cursor.open();
        cursor
    }

    #[inline]
    fn is_exhausted(&self) -> bool {
        self.index >= self.domains.len()
    }

    /// Set up the domain at `index`; zero-length domains close on the spot.
    fn open(&mut self) {
        while let Some(domain) = self.domains.get(self.index) {
            if domain.length == Some(0) {
                self.rows.push((domain.name.clone(), String::new()));
                self.index += 1;
            } else {
                self.remaining = domain.length;
                self.filled = false;
                return;
            }
        }
        self.remaining = None;
    }

    fn close(&mut self) {
        let name = self.domains[self.index].name.clone();
        self.rows.push((name, std::mem::take(&mut self.current)));
        self.index += 1;
        self.open();
    }

    /// Write a character that takes no profile column.
    #[inline]
    fn push_free(&mut self, c: char) {
        if !self.is_exhausted() {
            self.current.push(c);
        }
    }

    fn pad(&mut self, n: usize) {
        for _ in 0..n {
            self.push_free('-');
        }
    }

    /// Write a character for one profile column.
    fn charge(&mut self, c: char) {
        if self.is_exhausted() {
            return;
        }
        self.current.push(c);
        self.filled = true;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                self.close();
            }
        }
    }

    /// Emit the domain left open, if it holds anything. It only counts as
    /// closed when it is an unbounded sink that received a column.
    fn finish(mut self) -> PaddedAlignment {
        let mut closed = self.rows.len();
        if !self.is_exhausted() && !self.current.is_empty() {
            if self.remaining.is_none() && self.filled {
                closed += 1;
            }
            let name = self.domains[self.index].name.clone();
            self.rows.push((name, self.current));
        }
        PaddedAlignment {
            domains: self.rows,
            closed,
        }
    }
}

/// Rebuild one read as padded, per-domain rows.
///
/// Every profile position `p` gets an insertion slot of `padding[p]`
/// characters before its column: the read's own inserted residues (raw)
/// followed by dashes. Positions before the hit are all dashes. Columns are
/// rendered by state: matches upper case, mismatches lower case, deletions
/// `-`. With `padding` set to `None` slots are empty.
///
/// Rows from the same batch and `padding` line up column for column.
pub fn split_domains(
    padding: Option<&PaddingCounts>,
    aln: &HmmAlignment,
    table: &DomainTable,
) -> PaddedAlignment {
    let slot = |pos: usize| padding.and_then(|p| p.get(&pos).copied()).unwrap_or(0);

    let mut cursor = DomainCursor::new(table);
    let hmm_from = aln.best_match.hmm_from;

    for pos in 0..hmm_from {
        cursor.pad(slot(pos));
        cursor.charge('-');
    }

    let mut pos = hmm_from;
    let mut run = 0;
    for &(c, state) in &aln.annotations {
        if state == AlnState::Insert {
            cursor.push_free(state.render(c));
            run += 1;
            continue;
        }
        cursor.pad(slot(pos).saturating_sub(run));
        run = 0;
        cursor.charge(state.render(c));
        pos += 1;
    }
    if run > 0 {
        cursor.pad(slot(pos).saturating_sub(run));
    }

    cursor.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::insert_padding::insert_padding;
    use crate::align::test_alignment;

    fn table(spec: &str) -> DomainTable {
        spec.parse().unwrap()
    }

    fn rows(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|&(n, s)| (n.to_string(), s.to_string())).collect()
    }

    #[test]
    fn test_full_length_without_insertions() {
        let domains = table("A:3,B:2,C:4");
        let aln = test_alignment("r", 0, "MMXMDMMLM");
        let padded = split_domains(None, &aln, &domains);

        assert_eq!(padded.domains, rows(&[("A", "MMx"), ("B", "M-"), ("C", "MMLM")]));
        assert!(padded.is_complete(&domains));
        assert_eq!(Some(padded.joined().len()), domains.profile_len());
    }

    #[test]
    fn test_leading_gap_spans_domains() {
        let domains = table("A:2,B:3,C:2");
        let aln = test_alignment("r", 3, "MMMM");
        let padded = split_domains(None, &aln, &domains);
        assert_eq!(padded.domains, rows(&[("A", "--"), ("B", "-MM"), ("C", "MM")]));
        assert_eq!(padded.closed, 3);
    }

    #[test]
    fn test_early_termination_is_incomplete() {
        let domains = table("A:2,B:3,C:2");
        let aln = test_alignment("r", 0, "MMM");
        let padded = split_domains(None, &aln, &domains);
        assert_eq!(padded.domains, rows(&[("A", "MM"), ("B", "M")]));
        assert_eq!(padded.closed, 1);
        assert!(!padded.is_complete(&domains));
    }

    #[test]
    fn test_ending_inside_last_domain_is_incomplete() {
        let domains = table("A:2,B:2,C:3");
        let padded = split_domains(None, &test_alignment("r", 0, "MMMMM"), &domains);
        // Every domain has a cell, but C is one column short.
        assert_eq!(padded.domains, rows(&[("A", "MM"), ("B", "MM"), ("C", "M")]));
        assert_eq!(padded.closed, 2);
        assert!(!padded.is_complete(&domains));

        let heavy = DomainTable::default();
        let padded = split_domains(None, &test_alignment("r", 0, &"M".repeat(120)), &heavy);
        assert_eq!(padded.domains.len(), 7);
        assert_eq!(padded.domains[6], ("H-FR4".to_string(), "M".repeat(8)));
        assert!(!padded.is_complete(&heavy));

        let padded = split_domains(None, &test_alignment("r", 0, &"M".repeat(123)), &heavy);
        assert!(padded.is_complete(&heavy));
    }

    #[test]
    fn test_trailing_insertion_does_not_reach_next_domain() {
        let domains = table("A:2,B:2");
        let padded = split_domains(None, &test_alignment("r", 0, "MMi"), &domains);
        assert_eq!(padded.domains, rows(&[("A", "MM"), ("B", "i")]));
        assert_eq!(padded.closed, 1);

        let sink = table("A:2,rest");
        assert!(!split_domains(None, &test_alignment("r", 0, "MMi"), &sink).is_complete(&sink));
        assert!(split_domains(None, &test_alignment("r", 0, "MMMi"), &sink).is_complete(&sink));
    }

    #[test]
    fn test_rows_align_across_batch() {
        let domains = table("A:3,B:3");
        let batch = vec![
            test_alignment("ins2", 0, "MMiiMMMM"),
            test_alignment("ins1", 0, "MMiMMMM"),
            test_alignment("late", 1, "MMiMMM"),
            test_alignment("plain", 0, "MMMMMM"),
        ];
        let counts = insert_padding(&batch);

        let batch_rows: Vec<PaddedAlignment> =
            batch.iter().map(|a| split_domains(Some(&counts), a, &domains)).collect();
        // Slot widths: two before column 2, one before column 3.
        assert_eq!(batch_rows[0].joined(), "MMiiM-MMM");
        assert_eq!(batch_rows[1].joined(), "MMi-M-MMM");
        assert_eq!(batch_rows[2].joined(), "-M--MiMMM");
        assert_eq!(batch_rows[3].joined(), "MM--M-MMM");
        for row in &batch_rows {
            assert_eq!(row.domains[0].1.len(), 5);
            assert_eq!(row.domains[1].1.len(), 4);
        }
    }

    #[test]
    fn test_padding_in_leading_gap() {
        let domains = table("A:4");
        let batch = vec![test_alignment("a", 0, "MiiMMM"), test_alignment("b", 2, "MM")];
        let counts = insert_padding(&batch);
        assert_eq!(split_domains(Some(&counts), &batch[1], &domains).joined(), "----MM");
    }

    #[test]
    fn test_trailing_insertion_padded() {
        let domains = table("A:2,rest");
        let batch = vec![test_alignment("a", 0, "MMMii"), test_alignment("b", 0, "MMMi")];
        let counts = insert_padding(&batch);
        let padded = split_domains(Some(&counts), &batch[1], &domains);
        assert_eq!(padded.domains, rows(&[("A", "MM"), ("rest", "Mi-")]));
        assert!(padded.is_complete(&domains));
    }

    #[test]
    fn test_zero_length_domain() {
        let domains = table("A:1,gap:0,B:1");
        let aln = test_alignment("r", 0, "MM");
        let padded = split_domains(None, &aln, &domains);
        assert_eq!(padded.domains, rows(&[("A", "M"), ("gap", ""), ("B", "M")]));
        assert!(padded.is_complete(&domains));
    }

    #[test]
    fn test_idempotent() {
        let domains = table("A:2,B:4");
        let batch = vec![test_alignment("a", 1, "MiMMXM"), test_alignment("b", 0, "MMiiMDM")];
        let counts = insert_padding(&batch);
        let first = split_domains(Some(&counts), &batch[0], &domains);
        let second = split_domains(Some(&counts), &batch[0], &domains);
        assert_eq!(first, second);
    }
}
