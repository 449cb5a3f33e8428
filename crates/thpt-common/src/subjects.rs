//! Exam subject catalog, exam groups, and grade bands
//!
//! Reference data for the national high-school exam: the nine canonical
//! subjects, the four admission groups (A/B/C/D) with their subject
//! triples, and the four grade bands used for aggregate reporting.
//!
//! The catalog is an explicit context object constructed once per run and
//! passed to whoever needs it, never ambient global state, so tests can
//! substitute a synthetic subject set.

use serde::{Deserialize, Serialize};

/// Minimum accepted score
pub const MIN_SCORE: f64 = 0.0;

/// Maximum accepted score
pub const MAX_SCORE: f64 = 10.0;

/// Round a score to the stored precision (two decimal places)
pub fn round_score(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// True if the score lies within the accepted domain
pub fn score_in_range(value: f64) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&value)
}

/// The nine exam subjects, in CSV column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectCode {
    Toan,
    NguVan,
    NgoaiNgu,
    VatLi,
    HoaHoc,
    SinhHoc,
    LichSu,
    DiaLi,
    Gdcd,
}

impl SubjectCode {
    /// All subjects in CSV column / display order
    pub const ALL: [SubjectCode; 9] = [
        SubjectCode::Toan,
        SubjectCode::NguVan,
        SubjectCode::NgoaiNgu,
        SubjectCode::VatLi,
        SubjectCode::HoaHoc,
        SubjectCode::SinhHoc,
        SubjectCode::LichSu,
        SubjectCode::DiaLi,
        SubjectCode::Gdcd,
    ];

    /// Stable code used as the column name in the store
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectCode::Toan => "toan",
            SubjectCode::NguVan => "ngu_van",
            SubjectCode::NgoaiNgu => "ngoai_ngu",
            SubjectCode::VatLi => "vat_li",
            SubjectCode::HoaHoc => "hoa_hoc",
            SubjectCode::SinhHoc => "sinh_hoc",
            SubjectCode::LichSu => "lich_su",
            SubjectCode::DiaLi => "dia_li",
            SubjectCode::Gdcd => "gdcd",
        }
    }

    /// Vietnamese display name
    pub fn display_name(&self) -> &'static str {
        match self {
            SubjectCode::Toan => "Toán",
            SubjectCode::NguVan => "Ngữ văn",
            SubjectCode::NgoaiNgu => "Ngoại ngữ",
            SubjectCode::VatLi => "Vật lý",
            SubjectCode::HoaHoc => "Hóa học",
            SubjectCode::SinhHoc => "Sinh học",
            SubjectCode::LichSu => "Lịch sử",
            SubjectCode::DiaLi => "Địa lý",
            SubjectCode::Gdcd => "GDCD",
        }
    }
}

impl std::str::FromStr for SubjectCode {
    type Err = crate::error::ThptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubjectCode::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| crate::error::ThptError::parse(format!("Unknown subject code: '{}'", s)))
    }
}

impl std::fmt::Display for SubjectCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Admission exam groups, each a triple of subjects ranked by total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExamGroup {
    A,
    B,
    C,
    D,
}

impl ExamGroup {
    pub const ALL: [ExamGroup; 4] = [ExamGroup::A, ExamGroup::B, ExamGroup::C, ExamGroup::D];

    /// The three subjects whose sum ranks this group
    pub fn subjects(&self) -> [SubjectCode; 3] {
        match self {
            ExamGroup::A => [SubjectCode::Toan, SubjectCode::VatLi, SubjectCode::HoaHoc],
            ExamGroup::B => [SubjectCode::Toan, SubjectCode::HoaHoc, SubjectCode::SinhHoc],
            ExamGroup::C => [SubjectCode::NguVan, SubjectCode::LichSu, SubjectCode::DiaLi],
            ExamGroup::D => [SubjectCode::NguVan, SubjectCode::Toan, SubjectCode::NgoaiNgu],
        }
    }

    /// Vietnamese display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ExamGroup::A => "Khối A",
            ExamGroup::B => "Khối B",
            ExamGroup::C => "Khối C",
            ExamGroup::D => "Khối D",
        }
    }
}

impl std::str::FromStr for ExamGroup {
    type Err = crate::error::ThptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "A" => Ok(ExamGroup::A),
            "B" => Ok(ExamGroup::B),
            "C" => Ok(ExamGroup::C),
            "D" => Ok(ExamGroup::D),
            _ => Err(crate::error::ThptError::parse(format!(
                "Unknown exam group: '{}' (expected A, B, C or D)",
                s
            ))),
        }
    }
}

impl std::fmt::Display for ExamGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExamGroup::A => write!(f, "A"),
            ExamGroup::B => write!(f, "B"),
            ExamGroup::C => write!(f, "C"),
            ExamGroup::D => write!(f, "D"),
        }
    }
}

/// Grade bands used for aggregate reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeBand {
    /// score >= 8
    Excellent,
    /// 6 <= score < 8
    Good,
    /// 4 <= score < 6
    Average,
    /// score < 4
    Weak,
}

impl GradeBand {
    /// Classify a score into its band
    pub fn from_score(score: f64) -> GradeBand {
        if score >= 8.0 {
            GradeBand::Excellent
        } else if score >= 6.0 {
            GradeBand::Good
        } else if score >= 4.0 {
            GradeBand::Average
        } else {
            GradeBand::Weak
        }
    }

    /// Vietnamese label
    pub fn label(&self) -> &'static str {
        match self {
            GradeBand::Excellent => "Giỏi",
            GradeBand::Good => "Khá",
            GradeBand::Average => "Trung bình",
            GradeBand::Weak => "Yếu",
        }
    }
}

/// One subject's reference metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub code: SubjectCode,
    pub display_name: String,
    pub group_code: Option<ExamGroup>,
    pub is_required: bool,
    pub is_active: bool,
    pub order: u16,
}

/// The set of recognized subjects for a run
///
/// Kept in display order; small and fixed-size, loaded once per run.
#[derive(Debug, Clone)]
pub struct SubjectCatalog {
    subjects: Vec<Subject>,
}

impl SubjectCatalog {
    /// Build a catalog from an explicit subject list (sorted by order)
    pub fn new(mut subjects: Vec<Subject>) -> Self {
        subjects.sort_by_key(|s| s.order);
        Self { subjects }
    }

    /// The canonical nine-subject catalog
    pub fn canonical() -> Self {
        let subjects = [
            (SubjectCode::Toan, Some(ExamGroup::A), true),
            (SubjectCode::NguVan, None, true),
            (SubjectCode::NgoaiNgu, None, true),
            (SubjectCode::VatLi, Some(ExamGroup::A), false),
            (SubjectCode::HoaHoc, Some(ExamGroup::A), false),
            (SubjectCode::SinhHoc, Some(ExamGroup::B), false),
            (SubjectCode::LichSu, Some(ExamGroup::C), false),
            (SubjectCode::DiaLi, Some(ExamGroup::C), false),
            (SubjectCode::Gdcd, Some(ExamGroup::D), false),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (code, group_code, is_required))| Subject {
            code,
            display_name: code.display_name().to_string(),
            group_code,
            is_required,
            is_active: true,
            order: (i + 1) as u16,
        })
        .collect();

        Self::new(subjects)
    }

    /// All subjects in display order
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Active subjects in display order
    pub fn active(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.iter().filter(|s| s.is_active)
    }

    /// Look up a subject by code
    pub fn get(&self, code: SubjectCode) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.code == code)
    }

    /// True if the code is part of this catalog
    pub fn contains(&self, code: SubjectCode) -> bool {
        self.get(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}
