//! Error types for the capability layer.

use thiserror::Error;

/// Convenience alias for results produced by fetchers and storage backends.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the capability implementations shipped in this crate.
///
/// Engine failures are not represented here: engines report `anyhow::Error`
/// so that whatever the backing store raises reaches the caller unchanged.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested document does not exist.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Document bytes were not valid UTF-8.
    #[error("{path} is not valid UTF-8")]
    Encoding { path: String },

    /// Storage backend failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON encoding/decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound { path },
            std::io::ErrorKind::InvalidData => CoreError::Encoding { path },
            _ => CoreError::Io { path, source },
        }
    }
}
