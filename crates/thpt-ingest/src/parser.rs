//! Record parser: one raw CSV row to a typed score record
//!
//! This is the hot loop of the bulk path. The parser is stateless, does no
//! I/O, and reports rejection as a value instead of an error. It does NOT
//! bound-check numeric scores; that is the strict validator's concern
//! ([`crate::validation`]) and keeping it out of here keeps the bulk path
//! branch-minimal.

use std::borrow::Cow;

use csv::StringRecord;
use thpt_common::record::{is_valid_sbd, ScoreRecord};
use thpt_common::subjects::{round_score, SubjectCode};

/// Why a row was not accepted; counted and skipped, never fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRejection {
    /// Registration number empty or not 8-10 digits
    InvalidRegistrationNumber,
    /// Every subject cell was empty, "null" or unparseable
    NoScores,
}

impl std::fmt::Display for RowRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowRejection::InvalidRegistrationNumber => {
                write!(f, "invalid registration number")
            },
            RowRejection::NoScores => write!(f, "no usable subject scores"),
        }
    }
}

/// Parse one positional CSV row into a [`ScoreRecord`]
///
/// Column layout: `sbd, toan, ngu_van, ngoai_ngu, vat_li, hoa_hoc,
/// sinh_hoc, lich_su, dia_li, gdcd, ma_ngoai_ngu`. Missing trailing
/// columns read as empty cells.
///
/// A row is accepted only if the registration number is well-formed and at
/// least one subject score parsed to a value.
pub fn parse_row(row: &StringRecord) -> Result<ScoreRecord, RowRejection> {
    let sbd = row.get(0).unwrap_or("").trim();
    if sbd.is_empty() || !is_valid_sbd(sbd) {
        return Err(RowRejection::InvalidRegistrationNumber);
    }

    let mut record = ScoreRecord::new(sbd);
    for (i, code) in SubjectCode::ALL.into_iter().enumerate() {
        record.set_score(code, parse_score(row.get(i + 1).unwrap_or("")));
    }

    record.ma_ngoai_ngu = match row.get(10).map(str::trim) {
        Some("") | None => None,
        Some(code) => Some(code.to_string()),
    };

    if !record.has_any_score() {
        return Err(RowRejection::NoScores);
    }

    Ok(record)
}

/// Parse one score cell
///
/// Empty cells and the literal `"null"` are absent scores. The decimal
/// separator may be `.` or `,`. Values are rounded to two decimal places;
/// no range check happens here.
fn parse_score(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return None;
    }

    // Only allocate when a decimal comma actually needs normalizing.
    let normalized: Cow<'_, str> = if trimmed.contains(',') {
        Cow::Owned(trimmed.replace(',', "."))
    } else {
        Cow::Borrowed(trimmed)
    };

    normalized.parse::<f64>().ok().map(round_score)
}
