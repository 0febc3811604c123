//! Error types for the execution engine

use serde_json::Value as JsonValue;
use thiserror::Error;

/// Engine result type
pub type EngineResult<T> = Result<T, EngineError>;

/// Outcome of a single `call`, fanned out verbatim to every coalesced waiter
pub type CallOutcome = Result<JsonValue, EngineError>;

/// Execution engine errors
///
/// `Clone` because one leader outcome is delivered to arbitrarily many
/// waiters; payloads are plain strings for the same reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Rejected at construction time, never deferred to first call
    #[error("invalid function registration: {0}")]
    InvalidRegistration(String),

    /// A declared required field is absent from the input payload
    #[error("missing required field: {field}")]
    MissingField { field: String },

    /// The handler completed with an error
    #[error("handler failed: {0}")]
    HandlerFailed(String),

    /// The handler panicked; caught at the engine boundary
    #[error("handler panicked: {0}")]
    HandlerPanicked(String),

    /// The optional pending-execution guard fired
    #[error("handler timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The leader execution vanished without notifying its waiters
    #[error("internal engine error: {0}")]
    Internal(String),
}
