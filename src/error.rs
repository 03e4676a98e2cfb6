//src/error.rs

use std::io;
use std::path::PathBuf;

/// Why a single read produced no alignment. None of these abort a batch.
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// hmmsearch reported no hit above its inclusion threshold.
    #[error("no hit satisfies the reporting thresholds")]
    NoHitFound,

    /// The report does not have the layout the parser relies on.
    #[error("couldn't parse {context}: {reason}")]
    Format { context: &'static str, reason: String },

    /// A column triple fell through every classification rule.
    #[error("unclassifiable alignment column: reference {reference:?}, match {score:?}, target {target:?}")]
    InternalInvariantViolation {
        reference: char,
        score: char,
        target: char,
    },

    #[error("cannot read report {}: {source}", .path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ReadError {
    pub(crate) fn format(context: &'static str, reason: impl Into<String>) -> Self {
        ReadError::Format {
            context,
            reason: reason.into(),
        }
    }

    /// `true` for the expected "nothing found" outcome.
    pub fn is_no_hit(&self) -> bool {
        matches!(self, ReadError::NoHitFound)
    }
}

/// Errors raised while building a [`DomainTable`](crate::domains::DomainTable).
#[derive(thiserror::Error, Debug)]
pub enum DomainTableError {
    #[error("domain table is empty")]
    Empty,
    #[error("domain entry {entry:?} has no name")]
    MissingName { entry: String },
    #[error("invalid length {length:?} for domain {name}")]
    InvalidLength { name: String, length: String },
    #[error("only the last domain may omit its length (found {name})")]
    UnboundedNotLast { name: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}
