//! Error types for the libraries registry.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid registry URI: {uri}")]
    InvalidUri { uri: String },

    #[error("Path escapes registry root: {uri}")]
    PathEscapesRoot { uri: String },

    /// The registry directory is never web-accessible.
    #[error("{scheme} should not be public")]
    NotPublic { scheme: String },

    #[error("Library source {source_name} failed: {message}")]
    Source { source_name: String, message: String },
}

impl RegistryError {
    pub(crate) fn io(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        RegistryError::Io {
            message: message.into(),
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RegistryError>;
