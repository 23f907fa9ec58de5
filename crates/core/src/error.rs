//! Error types for the workload feature pipeline.

use crate::types::RecordKey;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the workload feature pipeline.
///
/// Every data error is fatal: the computation is a pure function of its
/// input, so a failure always points at a defect upstream.
#[derive(Error, Debug)]
pub enum Error {
    /// Required column absent, or a value of the wrong type or range.
    #[error("Schema error in column `{column}`: {detail}")]
    Schema { column: String, detail: String },

    /// Two records share the same (entity_id, season, week).
    #[error("Duplicate record for {key}")]
    DuplicateKey { key: RecordKey },

    /// No records to process.
    #[error("Empty input: at least one record is required")]
    EmptyInput,

    /// Injury flag outside {0, 1}.
    #[error("Invalid injury flag {value} for {key}")]
    InvalidFlag { key: RecordKey, value: f64 },

    /// A weekly stats row has no matching injury row.
    #[error("No injury record for {key}")]
    MissingInjury { key: RecordKey },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reader/writer error.
    #[error("CSV error: {0}")]
    Csv(String),
}

impl Error {
    /// Create a schema error.
    pub fn schema(column: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Schema {
            column: column.into(),
            detail: detail.into(),
        }
    }

    /// Create a duplicate key error.
    pub fn duplicate_key(key: RecordKey) -> Self {
        Error::DuplicateKey { key }
    }

    /// Create an invalid flag error.
    pub fn invalid_flag(key: RecordKey, value: f64) -> Self {
        Error::InvalidFlag { key, value }
    }

    /// Create a missing injury error.
    pub fn missing_injury(key: RecordKey) -> Self {
        Error::MissingInjury { key }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a CSV error.
    pub fn csv(msg: impl Into<String>) -> Self {
        Error::Csv(msg.into())
    }

    /// The record key this error refers to, if any.
    pub fn key(&self) -> Option<&RecordKey> {
        match self {
            Error::DuplicateKey { key }
            | Error::InvalidFlag { key, .. }
            | Error::MissingInjury { key } => Some(key),
            _ => None,
        }
    }
}
