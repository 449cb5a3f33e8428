//! Stored row types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thpt_common::subjects::{ExamGroup, SubjectCode};

/// A score record as persisted, including insertion timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StoredScore {
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredScore {
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

    /// Total score for an exam group, None unless all three subjects
    /// carry a score
    pub fn group_total(&self, group: ExamGroup) -> Option<f64> {
        let [a, b, c] = group.subjects();
        Some(self.score(a)? + self.score(b)? + self.score(c)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StoredScore {
        StoredScore {
            sbd: "12345678".to_string(),
            toan: Some(8.0),
            ngu_van: Some(7.0),
            ngoai_ngu: None,
            vat_li: Some(6.5),
            hoa_hoc: Some(9.0),
            sinh_hoc: None,
            lich_su: None,
            dia_li: None,
            gdcd: None,
            ma_ngoai_ngu: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_total_complete() {
        let score = sample();
        assert_eq!(score.group_total(ExamGroup::A), Some(8.0 + 6.5 + 9.0));
    }

    #[test]
    fn test_group_total_missing_subject() {
        let score = sample();
        // Group D needs ngoai_ngu, which is absent
        assert_eq!(score.group_total(ExamGroup::D), None);
    }
}
