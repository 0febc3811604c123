//! IPC error types

use std::time::Duration;
use thiserror::Error;

/// Errors crossing the supervisor/worker process boundary
#[derive(Error, Debug)]
pub enum IpcError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The peer wrote something that is not a protocol message
    #[error("malformed handshake message: {0}")]
    Malformed(String),

    /// The peer exited or closed its stream before the handshake completed
    #[error("connection closed before handshake completed")]
    ConnectionClosed,

    #[error("protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },

    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),
}

impl From<std::io::Error> for IpcError {
    fn from(err: std::io::Error) -> Self {
        IpcError::Io(err.to_string())
    }
}
