// src/align/insert_padding.rs

use ahash::AHashMap;

use crate::types::{AlnState, HmmAlignment};

/// Profile position -> longest run of insertions seen right before that
/// position's column, across a batch. Absent positions mean 0.
pub type PaddingCounts = AHashMap<usize, usize>;

#[inline]
fn record_run(counts: &mut PaddingCounts, pos: usize, run: usize) {
    if run > 0 {
        let slot = counts.entry(pos).or_insert(0);
        *slot = (*slot).max(run);
    }
}

/// Fold one alignment's insertion runs into `counts`.
///
/// The walk starts at `hmm_from`; a run is recorded at the position of the
/// column that ends it (or at the final position for a trailing run).
pub fn update_insert_counts(counts: &mut PaddingCounts, annotations: &[(char, AlnState)], hmm_from: usize) {
    let mut pos = hmm_from;
    let mut run = 0;
    for &(_, state) in annotations {
        if state == AlnState::Insert {
            run += 1;
        } else {
            record_run(counts, pos, run);
            run = 0;
            pos += 1;
        }
    }
    record_run(counts, pos, run);
}

/// Merge two partial results, keeping the larger run per position.
pub fn merge_padding_counts(mut a: PaddingCounts, b: PaddingCounts) -> PaddingCounts {
    a.reserve(b.len());
    for (pos, run) in b {
        record_run(&mut a, pos, run);
    }
    a
}

/// Maximum insertion run per profile position over all `alignments`.
pub fn insert_padding(alignments: &[HmmAlignment]) -> PaddingCounts {
    let mut counts = PaddingCounts::default();
    for aln in alignments {
        update_insert_counts(&mut counts, &aln.annotations, aln.best_match.hmm_from);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::test_alignment;
    use crate::types::AlnState::*;

    #[test]
    fn test_runs_recorded_at_following_column() {
        let mut counts = PaddingCounts::default();
        let annots = vec![
            ('A', MatchHigh),
            ('x', Insert),
            ('y', Insert),
            ('C', MatchHigh),
            ('z', Insert),
            ('D', Mismatch),
        ];
        update_insert_counts(&mut counts, &annots, 4);
        assert_eq!(counts.get(&5), Some(&2));
        assert_eq!(counts.get(&6), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_trailing_run_flushed() {
        let mut counts = PaddingCounts::default();
        update_insert_counts(&mut counts, &[('A', MatchHigh), ('-', Delete), ('q', Insert)], 0);
        assert_eq!(counts.get(&2), Some(&1));
    }

    #[test]
    fn test_order_independent() {
        let a = test_alignment("a", 0, "MMiiMM");
        let b = test_alignment("b", 1, "MiiiMM");
        let c = test_alignment("c", 0, "MMiMiM");

        let forward = insert_padding(&[a.clone(), b.clone(), c.clone()]);
        let backward = insert_padding(&[c, b, a]);
        assert_eq!(forward, backward);
        assert_eq!(forward.get(&2), Some(&3));
        assert_eq!(forward.get(&3), Some(&1));
    }

    #[test]
    fn test_merge_keeps_max() {
        let mut a = PaddingCounts::default();
        a.insert(3, 2);
        let mut b = PaddingCounts::default();
        b.insert(3, 5);
        b.insert(7, 1);
        let merged = merge_padding_counts(a, b);
        assert_eq!(merged.get(&3), Some(&5));
        assert_eq!(merged.get(&7), Some(&1));
    }
}
