// src/align/align_reads.rs

use rayon::prelude::*;

use super::insert_padding::{merge_padding_counts, update_insert_counts, PaddingCounts};
use super::split_domains::{split_domains, PaddedAlignment};
use crate::domains::DomainTable;
use crate::error::ReadError;
use crate::types::{FailedRead, HmmAlignment, ReadInput};

/// Parse every read's report in parallel. Results keep input order.
pub fn parse_reads_parallel(inputs: &[ReadInput]) -> Vec<Result<HmmAlignment, ReadError>> {
    inputs
        .par_iter()
        .map(|input| {
            HmmAlignment::from_report(&input.report, &input.record.dna_seq, &input.record.tgt_seq)
        })
        .collect()
}

/// Parallel fold of insertion runs over the whole batch, merged per thread.
///
/// This is the batch barrier: it needs every parsed alignment before any
/// read can be padded.
pub fn insert_padding_parallel(alignments: &[HmmAlignment]) -> PaddingCounts {
    alignments
        .par_iter()
        .fold(PaddingCounts::default, |mut acc, aln| {
            update_insert_counts(&mut acc, &aln.annotations, aln.best_match.hmm_from);
            acc
        })
        .reduce(PaddingCounts::default, merge_padding_counts)
}

/// Pad and split every alignment against the shared, read-only counts.
pub fn split_domains_parallel(
    alignments: &[HmmAlignment],
    padding: Option<&PaddingCounts>,
    table: &DomainTable,
) -> Vec<PaddedAlignment> {
    alignments
        .par_iter()
        .map(|aln| split_domains(padding, aln, table))
        .collect()
}

/// Everything the three stages produce for one batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub alignments: Vec<HmmAlignment>,
    pub padded: Vec<PaddedAlignment>,
    pub failures: Vec<FailedRead>,
    pub padding_counts: Option<PaddingCounts>,
}

/// Run parse -> padding reduction -> domain splitting over a batch.
///
/// A read that fails to parse is recorded in `failures` and left out of
/// the padding counts and the padded rows; the rest of the batch carries on.
pub fn align_batch(inputs: &[ReadInput], table: &DomainTable, use_padding: bool) -> BatchOutcome {
    let parsed = parse_reads_parallel(inputs);

    let mut alignments = Vec::with_capacity(parsed.len());
    let mut failures = Vec::new();
    for (input, result) in inputs.iter().zip(parsed) {
        match result {
            Ok(aln) => alignments.push(aln),
            Err(error) => {
                match &error {
                    ReadError::NoHitFound => log::debug!("{}: {}", input.record.id, error),
                    ReadError::InternalInvariantViolation { .. } => {
                        log::error!("{}: {}", input.record.id, error)
                    }
                    _ => log::warn!("{}: {}", input.record.id, error),
                }
                failures.push(FailedRead {
                    read_id: input.record.id.clone(),
                    error,
                });
            }
        }
    }

    let padding_counts = use_padding.then(|| insert_padding_parallel(&alignments));
    if let Some(counts) = &padding_counts {
        log::info!(
            "insertion padding: {} positions, widest slot {}",
            counts.len(),
            counts.values().copied().max().unwrap_or(0)
        );
    }

    let padded = split_domains_parallel(&alignments, padding_counts.as_ref(), table);

    BatchOutcome {
        alignments,
        padded,
        failures,
        padding_counts,
    }
}
