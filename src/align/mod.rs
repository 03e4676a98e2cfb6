pub mod align_reads;
pub mod align_stats;
pub mod insert_padding;
pub mod split_domains;

pub use align_reads::{align_batch, BatchOutcome};
pub use insert_padding::PaddingCounts;
pub use split_domains::PaddedAlignment;

/// Build an alignment from a compact state pattern: `M` match, `L` low
/// match, `X` mismatch, `D` deletion, `i` insertion.
#[cfg(test)]
pub(crate) fn test_alignment(id: &str, hmm_from: usize, pattern: &str) -> crate::types::HmmAlignment {
    use crate::types::{AlnState, BestMatch, HmmAlignment};

    let annotations: Vec<(char, AlnState)> = pattern
        .chars()
        .map(|c| match c {
            'M' => ('M', AlnState::MatchHigh),
            'L' => ('L', AlnState::MatchLow),
            'X' => ('X', AlnState::Mismatch),
            'D' => ('-', AlnState::Delete),
            'i' => ('i', AlnState::Insert),
            other => panic!("unknown pattern state {other:?}"),
        })
        .collect();
    let columns = annotations.iter().filter(|(_, s)| s.consumes_reference()).count();
    let tgt_seq: String = annotations.iter().map(|&(c, _)| c).filter(|&c| c != '-').collect();

    HmmAlignment {
        seq_id: id.to_string(),
        best_match: BestMatch {
            score: 50.0,
            bias: 0.0,
            c_evalue: 1e-10,
            i_evalue: 1e-10,
            hmm_from,
            hmm_to: hmm_from + columns,
            tgt_from: 0,
            tgt_to: tgt_seq.len(),
            env_from: 0,
            env_to: tgt_seq.len(),
            acc: 0.9,
        },
        dna_seq: String::new(),
        tgt_len: tgt_seq.len(),
        tgt_seq,
        score_and_eval: (50.0, 1e-10),
        annotations,
    }
}
