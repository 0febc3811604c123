//! Handshake protocol and wire types for Conflux
//!
//! Defines the single-line JSON handshake a worker emits on stdout after it
//! starts accepting requests, plus the request/response shapes of the
//! supervisor control API and the worker call transport. The supervisor and
//! workers share no memory; these messages are the entire boundary.

pub mod error;
pub mod handshake;
pub mod protocol;

pub use error::IpcError;
pub use handshake::{read_snapshot_line, write_snapshot_line};
pub use protocol::{
    AckResponse, CallFailure, CallRequest, CallResponse, Envelope, FailureCode, StartRequest,
    StartResponse, StatusResponse, StopRequest, StopResponse, WorkerSnapshot, WorkerStatus,
    PROTOCOL_VERSION,
};
