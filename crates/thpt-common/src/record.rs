//! The normalized score record produced by ingestion

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::subjects::SubjectCode;

static SBD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{8,10}$").unwrap_or_else(|e| panic!("invalid SBD pattern: {e}"))
});

/// True if the string is a well-formed registration number (8-10 digits)
pub fn is_valid_sbd(sbd: &str) -> bool {
    SBD_PATTERN.is_match(sbd)
}

/// One student's scores across all nine subjects
///
/// The natural key is `sbd` (the registration number). Every subject score
/// is optional; a record with no scores at all is never accepted by
/// ingestion, but the type itself does not enforce that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub sbd: String,
    pub toan: Option<f64>,
    pub ngu_van: Option<f64>,
    pub ngoai_ngu: Option<f64>,
    pub vat_li: Option<f64>,
    pub hoa_hoc: Option<f64>,
    pub sinh_hoc: Option<f64>,
    pub lich_su: Option<f64>,
    pub dia_li: Option<f64>,
    pub gdcd: Option<f64>,
    pub ma_ngoai_ngu: Option<String>,
}

impl ScoreRecord {
    /// Create an empty record for the given registration number
    pub fn new(sbd: impl Into<String>) -> Self {
        Self {
            sbd: sbd.into(),
            toan: None,
            ngu_van: None,
            ngoai_ngu: None,
            vat_li: None,
            hoa_hoc: None,
            sinh_hoc: None,
            lich_su: None,
            dia_li: None,
            gdcd: None,
            ma_ngoai_ngu: None,
        }
    }

    /// The score for a given subject
    pub fn score(&self, code: SubjectCode) -> Option<f64> {
        match code {
            SubjectCode::Toan => self.toan,
            SubjectCode::NguVan => self.ngu_van,
            SubjectCode::NgoaiNgu => self.ngoai_ngu,
            SubjectCode::VatLi => self.vat_li,
            SubjectCode::HoaHoc => self.hoa_hoc,
            SubjectCode::SinhHoc => self.sinh_hoc,
            SubjectCode::LichSu => self.lich_su,
            SubjectCode::DiaLi => self.dia_li,
            SubjectCode::Gdcd => self.gdcd,
        }
    }

    /// Set the score for a given subject
    pub fn set_score(&mut self, code: SubjectCode, value: Option<f64>) {
        match code {
            SubjectCode::Toan => self.toan = value,
            SubjectCode::NguVan => self.ngu_van = value,
            SubjectCode::NgoaiNgu => self.ngoai_ngu = value,
            SubjectCode::VatLi => self.vat_li = value,
            SubjectCode::HoaHoc => self.hoa_hoc = value,
            SubjectCode::SinhHoc => self.sinh_hoc = value,
            SubjectCode::LichSu => self.lich_su = value,
            SubjectCode::DiaLi => self.dia_li = value,
            SubjectCode::Gdcd => self.gdcd = value,
        }
    }

    /// All subject scores paired with their codes, in column order
    pub fn subject_scores(&self) -> [(SubjectCode, Option<f64>); 9] {
        SubjectCode::ALL.map(|code| (code, self.score(code)))
    }

    /// True if at least one subject carries a score
    pub fn has_any_score(&self) -> bool {
        SubjectCode::ALL.iter().any(|&code| self.score(code).is_some())
    }
}
