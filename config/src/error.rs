use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while declaring, resolving or converting configuration values
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid parameter name: {0:?}")]
    InvalidName(String),

    #[error("Unknown parameter {name} in module {module}")]
    UnknownParameter { module: String, name: String },

    #[error("Missing required configuration {name} (set it via the {env} environment variable)")]
    MissingRequired { name: String, env: String },

    #[error("Invalid number for {name}: {value:?}")]
    InvalidNumber { name: String, value: String },

    #[error("Invalid boolean for {name}: {value:?}")]
    InvalidBoolean { name: String, value: String },

    #[error("Invalid duration for {name}: {value:?}")]
    InvalidDuration { name: String, value: String },

    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Type alias for Results using ConfigError
pub type Result<T> = std::result::Result<T, ConfigError>;
