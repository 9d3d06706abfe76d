use std::path::PathBuf;

use thiserror::Error;

/// Failure raised by a messaging API operation.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid bridge url: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid date format for '{field}': {value} (use ISO-8601)")]
    InvalidDate { field: &'static str, value: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a harness wrapper that did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("not found")]
    NotFound,
    #[error("{operation} failed: {message}")]
    Failed {
        operation: &'static str,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
