//! Worker runtime error types

use thiserror::Error;

/// Worker runtime errors; registration and bind failures are startup-fatal,
/// everything request-triggered is converted to a failure response instead
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("configuration error: {0}")]
    Config(#[from] conflux_config::ConfigError),

    #[error("invalid function registration: {0}")]
    Registration(String),

    #[error("duplicate function '{0}'")]
    DuplicateFunction(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("handshake error: {0}")]
    Handshake(#[from] conflux_ipc::IpcError),
}

impl From<conflux_engine::EngineError> for WorkerError {
    fn from(err: conflux_engine::EngineError) -> Self {
        // Engine errors reach the worker boundary only at registration time;
        // call-time errors are relayed inside responses
        WorkerError::Registration(err.to_string())
    }
}
