use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the catalog, projection and file-mutation pipeline
#[derive(Debug, Error)]
pub enum ToolingError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse catalog: {0}")]
    CatalogParse(#[source] serde_json::Error),

    #[error("Factory type {0:?} is declared more than once in the catalog")]
    DuplicateFactory(String),

    #[error("Bean kind {kind:?} is declared by both {first} and {second}")]
    DuplicateBeanKind {
        kind: String,
        first: String,
        second: String,
    },

    #[error("No configuration found for instance {name:?} in {dir}")]
    InstanceNotFound { name: String, dir: PathBuf },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Type alias for Results using ToolingError
pub type Result<T> = std::result::Result<T, ToolingError>;
