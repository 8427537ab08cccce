//! Error types for the query engine and dataset loader.

use std::path::PathBuf;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors a query operation reports back to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    /// Argument rejected before any data was read.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Exact-key lookup matched nothing.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl QueryError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Status string carried in the failure envelope.
    pub fn status(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
        }
    }

    /// Message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument(m) | Self::NotFound(m) => m,
        }
    }
}

/// Errors raised while loading or validating the portfolio table.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate ticker in dataset: {0}")]
    DuplicateTicker(String),

    #[error("Empty ticker at row {0}")]
    EmptyTicker(usize),

    #[error("Invalid value for {field} on {ticker}: {value}")]
    InvalidField {
        ticker: String,
        field: &'static str,
        value: f64,
    },
}
