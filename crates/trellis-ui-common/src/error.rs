//! Error types for the orchestration core.

use std::sync::Arc;

use thiserror::Error;
use trellis_core::CoreError;

/// Result type for orchestration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the orchestration core.
#[derive(Debug, Error)]
pub enum Error {
    /// The store has not been bootstrapped yet.
    #[error("graph store not initialized: call init_store() first")]
    NotInitialized,

    /// A dataset or query document could not be fetched.
    #[error("failed to fetch {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: CoreError,
    },

    /// A dataset path served an HTML/XML page instead of graph data.
    #[error("{path} returned markup instead of graph data; check the configured dataset path")]
    MarkupInsteadOfData { path: String },

    /// The engine rejected a dataset.
    #[error("failed to parse dataset {path}: {source}\n--- content preview ---\n{preview}")]
    DatasetParse {
        path: String,
        preview: String,
        #[source]
        source: anyhow::Error,
    },

    /// The memoized bootstrap failed. Shared by every caller that awaited it.
    #[error("store bootstrap failed: {0}")]
    Bootstrap(Arc<Error>),

    /// Error raised by the graph engine, passed through unchanged.
    #[error(transparent)]
    Engine(anyhow::Error),

    /// A lifecycle call arrived before `mount`.
    #[error("pane {pane} is not mounted")]
    NotMounted { pane: String },

    /// `mount` was called twice on the same pane instance.
    #[error("pane {pane} is already mounted")]
    AlreadyMounted { pane: String },

    /// A pane needs a configured path that is missing.
    #[error("no path configured for {key}")]
    MissingPath { key: String },

    /// No pane is registered under this id.
    #[error("unknown pane: {0}")]
    UnknownPane(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Capability (storage) error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Unwrap a shared bootstrap failure to the error that caused it.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Bootstrap(inner) => inner.root_cause(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
