//! Worker runtime for Conflux
//!
//! Hosts a registry of named execution engines behind an HTTP transport,
//! reports its effective configuration as a snapshot (with the resolved
//! listen port), and emits the one-line stdout handshake the supervisor
//! reads. A request-triggered error is always converted into a failure
//! response; it never takes the process down.

pub mod app;
pub mod builtins;
pub mod error;
pub mod registry;
pub mod runtime;

pub use app::{create_app, AppState};
pub use error::WorkerError;
pub use registry::FunctionRegistry;
pub use runtime::WorkerRuntime;
