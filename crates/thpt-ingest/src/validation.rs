//! Strict score validation for API-facing record sets
//!
//! Unlike the bulk parser, this validator bound-checks every score and
//! produces structured per-field messages keyed `row_<index>.<field>`. It
//! never fails across the boundary; the report is always a value. This is
//! the authoritative acceptance gate for records arriving through non-bulk
//! paths.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thpt_common::record::{is_valid_sbd, ScoreRecord};
use thpt_common::subjects::{score_in_range, SubjectCatalog};

/// Outcome of validating a batch of score records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when no record produced an error
    pub valid: bool,
    /// `row_<index>.<field>` (or `row_<index>` for record-level problems)
    /// mapped to a human-readable message
    pub errors: BTreeMap<String, String>,
    /// The records that passed, in input order
    pub validated: Vec<ScoreRecord>,
    pub total_records: usize,
    pub valid_records: usize,
    pub error_records: usize,
}

/// Validate a batch of records against the subject catalog
pub fn validate_records(records: &[ScoreRecord], catalog: &SubjectCatalog) -> ValidationReport {
    let mut errors = BTreeMap::new();
    let mut validated = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let row_errors = validate_single_record(record, catalog, index);
        if row_errors.is_empty() {
            validated.push(record.clone());
        } else {
            errors.extend(row_errors);
        }
    }

    let valid_records = validated.len();
    ValidationReport {
        valid: errors.is_empty(),
        errors,
        total_records: records.len(),
        valid_records,
        error_records: records.len() - valid_records,
        validated,
    }
}

fn validate_single_record(
    record: &ScoreRecord,
    catalog: &SubjectCatalog,
    index: usize,
) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();

    if record.sbd.is_empty() || !is_valid_sbd(&record.sbd) {
        errors.insert(
            format!("row_{index}.sbd"),
            "SBD không hợp lệ (phải gồm 8-10 chữ số)".to_string(),
        );
    }

    let mut has_valid_score = false;
    for subject in catalog.active() {
        if let Some(score) = record.score(subject.code) {
            if !score_in_range(score) {
                errors.insert(
                    format!("row_{index}.{}", subject.code),
                    format!("Điểm {} không hợp lệ (phải từ 0-10)", subject.display_name),
                );
                continue;
            }
            has_valid_score = true;
        }
    }

    if !has_valid_score {
        errors.insert(
            format!("row_{index}"),
            "Phải có ít nhất 1 môn có điểm hợp lệ".to_string(),
        );
    }

    errors
}

/// Validate a registration number supplied as a search parameter
pub fn validate_search_sbd(sbd: &str) -> Result<(), String> {
    if sbd.is_empty() {
        return Err("Số báo danh là bắt buộc".to_string());
    }
    if !is_valid_sbd(sbd) {
        return Err("Số báo danh phải gồm 8-10 chữ số".to_string());
    }
    Ok(())
}
