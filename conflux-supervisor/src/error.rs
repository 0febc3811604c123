//! Supervisor error types

use thiserror::Error;

/// Process-control errors, surfaced as control-API failures; none of them
/// terminate the supervisor process
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("failed to spawn worker process: {0}")]
    Spawn(String),

    /// Worker exited before the handshake or emitted malformed output
    #[error("handshake failed: {0}")]
    Handshake(#[from] conflux_ipc::IpcError),

    #[error("worker not running: {0}")]
    NotRunning(String),

    /// The configuration source could not be resolved to an identity
    #[error("invalid configuration source: {0}")]
    Identity(String),

    #[error("failed to stop worker: {0}")]
    Stop(String),
}

impl From<conflux_config::ConfigError> for SupervisorError {
    fn from(err: conflux_config::ConfigError) -> Self {
        SupervisorError::Identity(err.to_string())
    }
}
