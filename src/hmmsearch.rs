//src/hmmsearch.rs

use regex::Regex;
use std::sync::OnceLock;

use crate::blocks::split_at_boundaries;
use crate::error::ReadError;
use crate::types::{AlnState, Annotation, BestMatch, HmmAlignment};

/// Opens the per-domain hit table.
pub const DOMAIN_ANNOTATION_MARKER: &str = "Domain annotation for each sequence";
/// Opens the per-domain alignments.
pub const ALIGNMENTS_MARKER: &str = "Alignments for each domain";
/// Closes the part of the report we read.
pub const PIPELINE_SUMMARY_MARKER: &str = "Internal pipeline statistics summary";

/// What hmmsearch prints in the domain annotation section when nothing hit.
pub const NO_HIT_SENTINEL: &str = "[No targets detected that satisfy reporting thresholds]";

const SEQ_TABLE: &str = "seq_table";
const ALIGNMENTS: &str = "alignments";

const REPORT_SECTIONS: [(&str, Option<&str>); 3] = [
    (DOMAIN_ANNOTATION_MARKER, Some(SEQ_TABLE)),
    (ALIGNMENTS_MARKER, Some(ALIGNMENTS)),
    (PIPELINE_SUMMARY_MARKER, None),
];

const TABLE_CONTEXT: &str = "block starting with 'Domain annotation for each sequence'";
const ALIGNMENT_CONTEXT: &str = "block starting with 'Alignments for each domain'";

/// Columns of a hit table row, in the order hmmsearch prints them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HitColumn {
    Ignored,
    Score,
    Bias,
    CEvalue,
    IEvalue,
    HmmFrom,
    HmmTo,
    AliFrom,
    AliTo,
    EnvFrom,
    EnvTo,
    Acc,
}

const NAMED_HIT_COLUMNS: usize = 11;

// `#  !  score bias c-Evalue i-Evalue hmmfrom hmm_to ..  alifrom ali_to ..  envfrom env_to ..  acc`
const HIT_ROW_TEMPLATE: [HitColumn; 16] = [
    HitColumn::Ignored,
    HitColumn::Ignored,
    HitColumn::Score,
    HitColumn::Bias,
    HitColumn::CEvalue,
    HitColumn::IEvalue,
    HitColumn::HmmFrom,
    HitColumn::HmmTo,
    HitColumn::Ignored,
    HitColumn::AliFrom,
    HitColumn::AliTo,
    HitColumn::Ignored,
    HitColumn::EnvFrom,
    HitColumn::EnvTo,
    HitColumn::Ignored,
    HitColumn::Acc,
];

/// One row of the hit table: the domain's rank and its statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRow {
    pub rank: Option<usize>,
    pub best_match: BestMatch,
}

fn domain_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^==\s+domain\s+(\d+)\s.*?score:\s*([-+]?\d*\.?\d+(?:[eE][-+]?\d+)?)\s+bits;\s+conditional E-value:\s*([-+]?\d*\.?\d+(?:[eE][-+]?\d+)?)",
        )
        .expect("domain header pattern is valid")
    })
}

fn parse_float(field: &'static str, token: &str) -> Result<f64, ReadError> {
    token
        .parse::<f64>()
        .map_err(|_| ReadError::format(TABLE_CONTEXT, format!("{field} is not a number: {token:?}")))
}

fn parse_coord(field: &'static str, token: &str) -> Result<usize, ReadError> {
    token
        .parse::<usize>()
        .map_err(|_| ReadError::format(TABLE_CONTEXT, format!("{field} is not a coordinate: {token:?}")))
}

/// Convert a 1-based inclusive hmmsearch interval to 0-based half-open.
fn half_open(field: &'static str, from: usize, to: usize) -> Result<(usize, usize), ReadError> {
    if from == 0 || from > to {
        return Err(ReadError::format(
            TABLE_CONTEXT,
            format!("{field} interval {from}..{to} is not a valid 1-based range"),
        ));
    }
    Ok((from - 1, to))
}

/// Parse one whitespace-separated hit row against the 16-slot template.
pub fn parse_hit_row(line: &str) -> Result<HitRow, ReadError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let mut floats = [None::<f64>; 5];
    let mut coords = [None::<usize>; 6];
    let mut resolved = 0;

    for (column, token) in HIT_ROW_TEMPLATE.iter().zip(tokens.iter().copied()) {
        match column {
            HitColumn::Ignored => continue,
            HitColumn::Score => floats[0] = Some(parse_float("score", token)?),
            HitColumn::Bias => floats[1] = Some(parse_float("bias", token)?),
            HitColumn::CEvalue => floats[2] = Some(parse_float("c-Evalue", token)?),
            HitColumn::IEvalue => floats[3] = Some(parse_float("i-Evalue", token)?),
            HitColumn::Acc => floats[4] = Some(parse_float("acc", token)?),
            HitColumn::HmmFrom => coords[0] = Some(parse_coord("hmm_from", token)?),
            HitColumn::HmmTo => coords[1] = Some(parse_coord("hmm_to", token)?),
            HitColumn::AliFrom => coords[2] = Some(parse_coord("ali_from", token)?),
            HitColumn::AliTo => coords[3] = Some(parse_coord("ali_to", token)?),
            HitColumn::EnvFrom => coords[4] = Some(parse_coord("env_from", token)?),
            HitColumn::EnvTo => coords[5] = Some(parse_coord("env_to", token)?),
        }
        resolved += 1;
    }

    if resolved != NAMED_HIT_COLUMNS {
        return Err(ReadError::format(
            TABLE_CONTEXT,
            format!("hit row resolved {resolved} of {NAMED_HIT_COLUMNS} named fields ({} tokens)", tokens.len()),
        ));
    }

    // All eleven slots are filled once `resolved` reaches the template count.
    let [Some(score), Some(bias), Some(c_evalue), Some(i_evalue), Some(acc)] = floats else {
        return Err(ReadError::format(TABLE_CONTEXT, "hit row is missing a score field"));
    };
    let [Some(hmm_from), Some(hmm_to), Some(ali_from), Some(ali_to), Some(env_from), Some(env_to)] =
        coords
    else {
        return Err(ReadError::format(TABLE_CONTEXT, "hit row is missing a coordinate field"));
    };

    let (hmm_from, hmm_to) = half_open("hmm", hmm_from, hmm_to)?;
    let (tgt_from, tgt_to) = half_open("ali", ali_from, ali_to)?;
    let (env_from, env_to) = half_open("env", env_from, env_to)?;

    Ok(HitRow {
        rank: tokens.first().and_then(|t| t.parse().ok()),
        best_match: BestMatch {
            score,
            bias,
            c_evalue,
            i_evalue,
            hmm_from,
            hmm_to,
            tgt_from,
            tgt_to,
            env_from,
            env_to,
            acc,
        },
    })
}

/// Parse the domain annotation section into the target id and its best hit.
///
/// Line 3 must be a full hit row. Further rows of a multi-domain hit are read
/// until the first line that is not one; the highest-scoring row wins.
pub fn parse_best_match<S: AsRef<str>>(block: &[S]) -> Result<(String, HitRow), ReadError> {
    let lines: Vec<&str> = block.iter().map(|l| l.as_ref().trim()).collect();

    if lines.first() == Some(&NO_HIT_SENTINEL) {
        return Err(ReadError::NoHitFound);
    }
    if lines.len() < 4 {
        return Err(ReadError::format(
            TABLE_CONTEXT,
            format!("expected at least 4 lines, found {}", lines.len()),
        ));
    }
    let Some(id_part) = lines[0].strip_prefix(">>") else {
        return Err(ReadError::format(TABLE_CONTEXT, "first line is not a '>>' target line"));
    };
    if !lines[1].starts_with('#') {
        return Err(ReadError::format(TABLE_CONTEXT, "missing '#' column header"));
    }
    if !lines[2].starts_with("--") {
        return Err(ReadError::format(TABLE_CONTEXT, "missing '--' separator"));
    }

    let seq_id = id_part.trim().to_string();
    let mut best = parse_hit_row(lines[3])?;
    for line in &lines[4..] {
        match parse_hit_row(line) {
            Ok(row) if row.best_match.score > best.best_match.score => best = row,
            Ok(_) => {}
            Err(_) => break,
        }
    }
    Ok((seq_id, best))
}

/// Assign the alignment state of one column.
///
/// Rules apply in order: inserted profile column, identity (ignoring case),
/// conservative substitution, deletion, blank-match mismatch.
pub fn classify_column(reference: char, score: char, target: char) -> Result<AlnState, ReadError> {
    if reference == '.' {
        Ok(AlnState::Insert)
    } else if target.eq_ignore_ascii_case(&reference) {
        Ok(AlnState::MatchHigh)
    } else if score == '+' {
        Ok(AlnState::MatchLow)
    } else if target == '-' {
        Ok(AlnState::Delete)
    } else if score == ' ' {
        Ok(AlnState::Mismatch)
    } else {
        Err(ReadError::InternalInvariantViolation {
            reference,
            score,
            target,
        })
    }
}

/// Whitespace-separated tokens with their byte offsets.
fn token_spans(line: &str) -> Vec<(usize, &str)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, &line[s..]));
    }
    spans
}

/// `name start body end`, as printed for the profile and the target.
fn is_sequence_row(line: &str, name: &str) -> bool {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens.len() == 4 && tokens[0] == name && tokens[1].parse::<usize>().is_ok()
}

/// Classify one (reference, match, target) row group, appending to `out`.
fn classify_rows(
    seq_id: &str,
    reference_row: &str,
    match_row: &str,
    target_row: &str,
    out: &mut Annotation,
) -> Result<(), ReadError> {
    let reference = token_spans(reference_row);
    if reference.len() != 4 {
        return Err(ReadError::format(
            ALIGNMENT_CONTEXT,
            format!("reference row has {} fields, expected 4", reference.len()),
        ));
    }
    let (body_offset, reference_body) = reference[2];

    if !target_row.trim_start().starts_with(seq_id) {
        return Err(ReadError::format(
            ALIGNMENT_CONTEXT,
            format!("target row does not start with '{seq_id}'"),
        ));
    }
    let target: Vec<&str> = target_row.split_whitespace().collect();
    if target.len() != 4 {
        return Err(ReadError::format(
            ALIGNMENT_CONTEXT,
            format!("target row has {} fields, expected 4", target.len()),
        ));
    }
    if target[0] != seq_id {
        return Err(ReadError::format(
            ALIGNMENT_CONTEXT,
            format!("inconsistent target names: '{}' != '{}'", target[0], seq_id),
        ));
    }
    let target_body = target[2];

    let width = reference_body.chars().count();
    if target_body.chars().count() != width {
        return Err(ReadError::format(
            ALIGNMENT_CONTEXT,
            format!(
                "reference and target rows differ in width ({} vs {})",
                width,
                target_body.chars().count()
            ),
        ));
    }

    // The match row lines up with the reference body by column offset.
    let skip = reference_row[..body_offset].chars().count();
    let scores = match_row.chars().skip(skip).chain(std::iter::repeat(' ')).take(width);

    out.reserve(width);
    for ((r, s), t) in reference_body.chars().zip(scores).zip(target_body.chars()) {
        out.push((t, classify_column(r, s, t)?));
    }
    Ok(())
}

/// Parse the alignments section for the hit with the given domain rank.
///
/// Returns `(bit_score, conditional_evalue)` from the domain header and the
/// per-column annotation. Wrapped alignments (repeated row groups for the
/// same profile) are joined.
pub fn parse_alignment<S: AsRef<str>>(
    seq_id: &str,
    block: &[S],
    rank: Option<usize>,
) -> Result<((f64, f64), Annotation), ReadError> {
    let lines: Vec<&str> = block.iter().map(AsRef::as_ref).collect();
    let header_re = domain_header_re();

    if lines.len() < 5 {
        return Err(ReadError::format(
            ALIGNMENT_CONTEXT,
            format!("expected at least 5 lines, found {}", lines.len()),
        ));
    }
    if !header_re.is_match(lines[0].trim()) {
        return Err(ReadError::format(ALIGNMENT_CONTEXT, "missing '== domain' score header"));
    }

    let header_at = match rank {
        None => 0,
        Some(rank) => lines
            .iter()
            .position(|l| {
                header_re
                    .captures(l.trim())
                    .and_then(|c| c[1].parse::<usize>().ok())
                    .is_some_and(|n| n == rank)
            })
            .ok_or_else(|| {
                ReadError::format(ALIGNMENT_CONTEXT, format!("no alignment for domain {rank}"))
            })?,
    };

    let caps = header_re
        .captures(lines[header_at].trim())
        .ok_or_else(|| ReadError::format(ALIGNMENT_CONTEXT, "malformed domain header"))?;
    let bit_score = caps[2]
        .parse::<f64>()
        .map_err(|_| ReadError::format(ALIGNMENT_CONTEXT, format!("bad bit score {:?}", &caps[2])))?;
    let c_evalue = caps[3]
        .parse::<f64>()
        .map_err(|_| ReadError::format(ALIGNMENT_CONTEXT, format!("bad E-value {:?}", &caps[3])))?;

    let body = &lines[header_at + 1..];
    let end = body
        .iter()
        .position(|l| l.trim_start().starts_with("=="))
        .unwrap_or(body.len());
    let rows = &body[..end];
    if rows.len() < 3 {
        return Err(ReadError::format(
            ALIGNMENT_CONTEXT,
            format!("domain {} has {} alignment rows", rank.unwrap_or(1), rows.len()),
        ));
    }

    let profile_name = rows[0].split_whitespace().next().unwrap_or_default();
    let mut annotations = Annotation::new();
    let mut at = 0;
    while at + 3 <= rows.len() && (at == 0 || is_sequence_row(rows[at], profile_name)) {
        // An all-blank match row is dropped as an empty line, leaving the
        // target row directly under the reference row.
        let blank_match = is_sequence_row(rows[at + 1], seq_id) && !is_sequence_row(rows[at + 2], seq_id);
        let (match_row, target_row, consumed) = if blank_match {
            ("", rows[at + 1], 3)
        } else {
            (rows[at + 1], rows[at + 2], 4)
        };
        classify_rows(seq_id, rows[at], match_row, target_row, &mut annotations)?;
        at += consumed;
    }

    Ok(((bit_score, c_evalue), annotations))
}

impl HmmAlignment {
    /// Build a read's alignment from the lines of its hmmsearch report.
    ///
    /// `Err(ReadError::NoHitFound)` is the ordinary outcome for reads without
    /// signal; the other errors mean the report was not in the expected shape.
    pub fn from_report<S: AsRef<str>>(
        report: &[S],
        dna_seq: &str,
        tgt_seq: &str,
    ) -> Result<Self, ReadError> {
        let sections = split_at_boundaries(report, &REPORT_SECTIONS);

        let table = sections
            .get(SEQ_TABLE)
            .ok_or_else(|| ReadError::format(TABLE_CONTEXT, "section not found"))?;
        let (seq_id, hit) = parse_best_match(table)?;

        let alignments = sections
            .get(ALIGNMENTS)
            .ok_or_else(|| ReadError::format(ALIGNMENT_CONTEXT, "section not found"))?;
        let (score_and_eval, annotations) = parse_alignment(&seq_id, alignments, hit.rank)?;

        let best_match = hit.best_match;
        let spanned = annotations
            .iter()
            .filter(|(_, state)| state.consumes_reference())
            .count();
        if spanned != best_match.hmm_to - best_match.hmm_from {
            return Err(ReadError::format(
                ALIGNMENT_CONTEXT,
                format!(
                    "alignment covers {} profile columns but the hit spans {}..{}",
                    spanned, best_match.hmm_from, best_match.hmm_to
                ),
            ));
        }

        log::debug!(
            "{}: hmm {}..{}, target {}..{}, {} columns",
            seq_id,
            best_match.hmm_from,
            best_match.hmm_to,
            best_match.tgt_from,
            best_match.tgt_to,
            annotations.len()
        );

        Ok(HmmAlignment {
            seq_id,
            best_match,
            dna_seq: dna_seq.to_string(),
            tgt_seq: tgt_seq.to_string(),
            tgt_len: tgt_seq.chars().count(),
            score_and_eval,
            annotations,
        })
    }
}
