//! Error types shared across the THPT workspace

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, ThptError>;

/// Error type for shared utilities
#[derive(Error, Debug)]
pub enum ThptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ThptError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}
