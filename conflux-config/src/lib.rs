//! Configuration management for Conflux
//!
//! YAML configuration split by domain (worker, supervisor), with defaults,
//! environment variable overrides, and validation. A configuration file is
//! also a worker's identity: the supervisor keys its registry by the
//! canonicalized path of the file a worker was started from.

pub mod domains;
pub mod error;
pub mod identity;
pub mod loader;

pub use domains::supervisor::SupervisorConfig;
pub use domains::worker::{BuiltinHandler, FunctionConfig, WorkerConfig};
pub use domains::ConfluxConfig;
pub use error::{ConfigError, ConfigResult};
pub use identity::canonical_identity;
pub use loader::ConfigLoader;
