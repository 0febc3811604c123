//! Configuration error types

use thiserror::Error;

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors; all fatal, raised before serving begins
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    ValidationError(String),

    #[error("environment variable error: {0}")]
    EnvError(String),

    /// Validation failure annotated with the offending source file
    #[error("invalid configuration in {source_path}: {message}")]
    SourceError {
        source_path: String,
        message: String,
    },
}
