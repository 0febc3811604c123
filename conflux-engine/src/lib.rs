//! Execution and caching engine for Conflux
//!
//! Wraps a single named function behind a `call` contract that caches
//! successful results per cache key and coalesces concurrent calls sharing a
//! key onto one leader execution. Failures are never cached. The engine has
//! no knowledge of transports or processes; hosting those is the worker
//! runtime's job.

pub mod engine;
pub mod error;
pub mod handler;
pub mod store;

pub use engine::{Engine, EngineConfig};
pub use error::{CallOutcome, EngineError, EngineResult};
pub use handler::{FunctionSpec, Handler};
pub use store::{CacheStore, EvictionPolicy, KeepForever, MaxEntries};
