//! Process supervisor and control plane for Conflux
//!
//! Spawns worker runtimes as independent processes, learns each one's
//! effective configuration through the stdout handshake, and exposes a
//! control API to start and stop workers by configuration identity. The
//! supervisor terminates itself when a stop carrying the exit-if-last flag
//! empties its registry, or on an explicit shutdown request.

pub mod app;
pub mod error;
pub mod spawner;
pub mod supervisor;

pub use app::create_control_app;
pub use error::SupervisorError;
pub use spawner::{ProcessSpawner, SpawnedWorker, WorkerHandle, WorkerSpawner};
pub use supervisor::Supervisor;
