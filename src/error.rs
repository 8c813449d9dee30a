//! Error types for data loading and profile validation

use std::path::PathBuf;

use thiserror::Error;

/// Errors from reading recipe tables, price lists and account payloads
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unusable {what} payload: {reason}")]
    Payload { what: &'static str, reason: String },

    #[error("upstream query failed: {0}")]
    Upstream(String),
}

/// Profile fields outside their allowed range
#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("profile name must be 1-{max} characters, got {len}")]
    InvalidName { len: usize, max: usize },

    #[error("workers must be between 0 and {max}, got {got}")]
    InvalidWorkers { got: i64, max: i64 },

    #[error("factory count must be between 1 and {max}, got {got}")]
    InvalidFactoryCount { got: i64, max: i64 },
}
