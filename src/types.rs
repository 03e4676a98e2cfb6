//src/types.rs

/// State of one aligned column, assigned from the (reference, match, target)
/// characters hmmsearch prints for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlnState {
    /// Target residue identical to the profile consensus.
    MatchHigh,
    /// Conservative substitution (`+` in the match row).
    MatchLow,
    Mismatch,
    /// Target residue with no profile column (`.` in the reference row).
    Insert,
    /// Profile column with no target residue (`-` in the target row).
    Delete,
}

impl AlnState {
    /// Every state except `Insert` advances the profile position.
    #[inline]
    pub fn consumes_reference(self) -> bool {
        !matches!(self, AlnState::Insert)
    }

    /// Character written into a padded row for a column in this state.
    #[inline]
    pub fn render(self, target: char) -> char {
        match self {
            AlnState::MatchHigh | AlnState::MatchLow => target.to_ascii_uppercase(),
            AlnState::Mismatch => target.to_ascii_lowercase(),
            AlnState::Delete => '-',
            AlnState::Insert => target,
        }
    }
}

/// `(target_char, state)` per aligned column, in profile order.
pub type Annotation = Vec<(char, AlnState)>;

/// The best hit row of the per-domain table.
///
/// Coordinates are 0-based half-open (hmmsearch prints 1-based inclusive),
/// so `hmm_to - hmm_from` is the number of profile columns the hit covers and
/// `tgt_seq[tgt_from..tgt_to]` is the aligned target span.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch {
    pub score: f64,
    pub bias: f64,
    pub c_evalue: f64,
    pub i_evalue: f64,
    pub hmm_from: usize,
    pub hmm_to: usize,
    pub tgt_from: usize,
    pub tgt_to: usize,
    pub env_from: usize,
    pub env_to: usize,
    pub acc: f64,
}

/// One read's parsed hmmsearch result. Immutable once built.
#[derive(Debug, Clone)]
pub struct HmmAlignment {
    pub seq_id: String,
    pub best_match: BestMatch,
    pub dna_seq: String,
    /// Translated target the profile was searched against.
    pub tgt_seq: String,
    pub tgt_len: usize,
    /// `(bit score, conditional E-value)` from the domain header.
    pub score_and_eval: (f64, f64),
    pub annotations: Annotation,
}

/// A minimal representation of a read: its translated target and, when
/// known, the DNA it was translated from.
#[derive(Debug, Clone)]
pub struct ReadRecord {
    pub id: String,
    pub dna_seq: String,
    pub tgt_seq: String,
}

/// A read paired with the text of its hmmsearch report.
#[derive(Debug, Clone)]
pub struct ReadInput {
    pub record: ReadRecord,
    pub report: Vec<String>,
}

/// A structured representation of one row of the domain report.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub read: String,
    /// One entry per domain of the table; empty when the read never reached it.
    pub domains: Vec<String>,
    pub complete: bool,
    pub frameshift: bool,
    pub stop: bool,
}

/// A structured representation of one summary metric.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub metric: &'static str,
    pub fraction: f64,
    pub count: usize,
    pub total: usize,
}

/// A read that produced no alignment, and why.
#[derive(Debug)]
pub struct FailedRead {
    pub read_id: String,
    pub error: crate::error::ReadError,
}
