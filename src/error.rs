use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the store, controller, codec and registry.
///
/// Only a malformed `entities` column is recovered locally (it loads as an
/// empty cache); everything else propagates on first occurrence.
#[derive(Debug, Error)]
pub enum Error {
    /// The file handed to an import does not exist.
    #[error("session file not found: {path}")]
    NotFound { path: PathBuf },

    /// An imported document is not a usable session document.
    #[error("invalid session document: {0}")]
    Format(String),

    /// Schema, query or connection failure from the durable store.
    #[error("store error: {0}")]
    Store(#[from] sea_orm::DbErr),

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Credential bytes (or their hex form) could not be decoded.
    #[error("failed to decode auth key: {0}")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for session persistence operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn decode(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Decode(Box::new(source))
    }
}
