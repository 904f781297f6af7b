use std::path::PathBuf;

use thiserror::Error;

/// Typed error for agent, sub-service and ingestion calls.
///
/// Keeps the failure category (network, HTTP status, stream read, parse,
/// service-reported) so the orchestrator can log it and the fallback
/// pipeline can show the raw detail.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure (DNS, connection, timeout)
    #[error("Network error: {0}")]
    Network(String),
    /// Endpoint returned a non-success HTTP status
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },
    /// Error reading from the event stream body
    #[error("Stream read error: {0}")]
    StreamRead(String),
    /// Response body was not the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),
    /// Service answered but reported an `error` field
    #[error("Service error: {0}")]
    Service(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Parse(e.to_string())
    }
}

/// Errors from the local `.dcpilot` store and log setup.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io { path: path.into(), source }
    }
}

/// Top-level failure of a command-line entry point.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}
