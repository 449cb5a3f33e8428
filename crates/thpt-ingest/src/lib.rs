//! THPT Ingest Library
//!
//! The bulk CSV ingestion pipeline for national exam scores: an untrusted
//! delimited-text dataset of up to millions of rows is parsed, validated
//! and loaded into the relational store under configurable memory and time
//! budgets, with all-or-nothing transactional semantics.
//!
//! Pipeline shape (see [`orchestrator::ImportRun`]):
//!
//! ```text
//! CSV row -> parser -> batch accumulator -> bulk loader -> store
//!                 \(rejected rows counted, never abort the run)
//! ```
//!
//! The whole run executes inside one enclosing transaction, opened after
//! the destination table is cleared, so a failure at any point leaves the
//! store exactly as it was before the run started.

pub mod batch;
pub mod error;
pub mod governor;
pub mod loader;
pub mod orchestrator;
pub mod parser;
pub mod report;
pub mod validation;

pub use error::ImportError;
pub use governor::Profile;
pub use orchestrator::{ImportRun, RunState};
pub use report::{NoopReporter, ProgressSink, RunSummary};
