//! Ingestion error taxonomy
//!
//! Per-row problems are values ([`crate::parser::RowRejection`]), counted
//! and skipped. Everything here is run-level: it aborts the enclosing
//! transaction and surfaces to the operator.

use std::path::PathBuf;

use thiserror::Error;
use thpt_store::StoreError;

#[derive(Error, Debug)]
pub enum ImportError {
    /// The CSV source path does not exist; fails before any transaction opens
    #[error("CSV source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A storage-level failure while flushing one sub-chunk; always fatal
    /// to the run
    #[error("Failed to insert sub-chunk of {rows} rows: {source}")]
    SubChunkWrite {
        rows: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for ImportError {
    fn from(e: sqlx::Error) -> Self {
        ImportError::Store(StoreError::Sqlx(e))
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
