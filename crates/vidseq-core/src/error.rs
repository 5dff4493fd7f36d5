//! Error types for vidseq.

use thiserror::Error;

/// Result type alias using vidseq's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for vidseq operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Video source cannot be opened, probed, or read
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Description or embedding backend failure (recoverable per-frame)
    #[error("Provider error ({backend}): {message}")]
    Provider { backend: String, message: String },

    /// Local model output could not be parsed at all
    #[error("Malformed provider response: {0}")]
    MalformedProviderResponse(String),

    /// Vector index upsert/query failure
    #[error("Index error: {0}")]
    Index(String),

    /// Query vector dimension disagrees with the index dimension
    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Clip extraction range is invalid
    #[error("Invalid range: start={start}, end={end}")]
    InvalidRange { start: f64, end: f64 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

impl Error {
    /// Build a [`Error::Provider`] from a backend name and any displayable cause.
    pub fn provider(backend: &str, cause: impl std::fmt::Display) -> Self {
        Error::Provider {
            backend: backend.to_string(),
            message: cause.to_string(),
        }
    }

    /// True for failures the ingestion loop absorbs as a skipped frame
    /// rather than a task abort.
    pub fn is_frame_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Provider { .. } | Error::MalformedProviderResponse(_) | Error::Index(_)
        )
    }
}
