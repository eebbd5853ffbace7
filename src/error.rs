use thiserror::Error;

use crate::search::Kind;

/// Main error type for the frontier search crate
#[derive(Error, Debug)]
pub enum FrontierError {
    /// File system I/O errors (snapshots, notes, fixtures)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP errors outside the relation oracle (note download)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Report submission errors
    #[error("Report error: {0}")]
    Report(String),

    /// `step` was called for a kind with nothing left to query
    #[error("Frontier for {0} is empty")]
    EmptyFrontier(Kind),
}

/// Convenient Result type using FrontierError
pub type Result<T> = std::result::Result<T, FrontierError>;
