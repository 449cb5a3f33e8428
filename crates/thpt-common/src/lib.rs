//! THPT Common Library
//!
//! Shared types and utilities for the THPT score platform workspace:
//!
//! - **Error Handling**: workspace-wide error and result types
//! - **Logging**: centralized `tracing` subscriber initialization
//! - **Subjects**: exam subject catalog, exam groups, and grade bands
//! - **Records**: the normalized score record produced by ingestion
//! - **Memory**: memory-limit string parsing (byte/K/M/G suffixes)

pub mod error;
pub mod logging;
pub mod mem;
pub mod record;
pub mod subjects;

// Re-export commonly used types
pub use error::{Result, ThptError};
pub use record::ScoreRecord;
pub use subjects::{ExamGroup, GradeBand, Subject, SubjectCatalog, SubjectCode};
