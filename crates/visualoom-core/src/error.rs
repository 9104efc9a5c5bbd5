//! Error types for visualoom-core.
//!
//! Every backend call fails with an [`ApiError`]. The client never swallows
//! errors; the components that call it decide whether a failure is silent
//! (passive loads) or surfaced to the user (explicit actions).

use thiserror::Error;

/// Errors raised by the API client and the components built on it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, reset).
    #[error("network error: {0}")]
    Network(String),
    /// The request did not complete within the configured timeout.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },
    /// The backend answered with a non-2xx status.
    #[error("backend returned HTTP {status}: {detail}")]
    HttpStatus { status: u16, detail: String },
    /// The response body did not match any shape we know how to read.
    #[error("unexpected response shape: {0}")]
    Schema(String),
    /// Rejected locally before any request was issued.
    #[error("{0}")]
    Validation(String),
    /// Local I/O failure (reading a file to upload)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Shorthand for a schema error with a formatted message.
    pub(crate) fn schema(msg: impl Into<String>) -> Self {
        ApiError::Schema(msg.into())
    }

    /// True for errors that were raised locally, before the network was touched.
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
