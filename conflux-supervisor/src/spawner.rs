//! Worker process spawning and the handshake exchange
//!
//! [`WorkerSpawner`] is the seam between supervision logic and process
//! plumbing: production uses [`ProcessSpawner`] to launch the worker binary
//! with a piped stdout and read exactly one handshake line; tests script
//! the seam instead of forking processes.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use conflux_ipc::{read_snapshot_line, WorkerSnapshot};

use crate::error::SupervisorError;

/// A live worker process the supervisor can terminate
#[async_trait]
pub trait WorkerHandle: Send + Sync {
    /// Signal the worker to terminate and wait for its exit
    async fn terminate(&mut self) -> Result<(), SupervisorError>;
}

/// Result of a successful spawn + handshake
pub struct SpawnedWorker {
    pub snapshot: WorkerSnapshot,
    pub handle: Box<dyn WorkerHandle>,
}

/// Spawns one worker from a configuration source and completes the
/// handshake before returning
#[async_trait]
pub trait WorkerSpawner: Send + Sync {
    async fn spawn(&self, config_path: &str) -> Result<SpawnedWorker, SupervisorError>;
}

/// Handle over a real child process
struct ProcessHandle {
    child: Child,
}

#[async_trait]
impl WorkerHandle for ProcessHandle {
    async fn terminate(&mut self) -> Result<(), SupervisorError> {
        self.child
            .start_kill()
            .map_err(|e| SupervisorError::Stop(e.to_string()))?;
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| SupervisorError::Stop(e.to_string()))?;
        debug!(?status, "worker process exited");
        Ok(())
    }
}

/// Production spawner: launches `<worker_program> worker --config <path>`
pub struct ProcessSpawner {
    worker_program: PathBuf,
    handshake_timeout: Duration,
}

impl ProcessSpawner {
    pub fn new(worker_program: PathBuf, handshake_timeout: Duration) -> Self {
        Self {
            worker_program,
            handshake_timeout,
        }
    }

    /// Spawn workers from the same executable the supervisor runs as
    pub fn from_current_exe(handshake_timeout: Duration) -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, handshake_timeout))
    }
}

#[async_trait]
impl WorkerSpawner for ProcessSpawner {
    async fn spawn(&self, config_path: &str) -> Result<SpawnedWorker, SupervisorError> {
        let mut child = Command::new(&self.worker_program)
            .arg("worker")
            .arg("--config")
            .arg(config_path)
            .arg("--silent")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            // Stderr flows through as observability output, never protocol
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SupervisorError::Spawn(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SupervisorError::Spawn("worker stdout not captured".to_string()))?;

        let mut reader = BufReader::new(stdout);
        match read_snapshot_line(&mut reader, self.handshake_timeout).await {
            Ok(snapshot) => {
                debug!(address = %snapshot.address(), pid = snapshot.pid, "handshake completed");
                Ok(SpawnedWorker {
                    snapshot,
                    handle: Box::new(ProcessHandle { child }),
                })
            }
            Err(error) => {
                warn!(%error, config = config_path, "handshake failed; reaping worker process");
                let _ = child.start_kill();
                let _ = child.wait().await;
                Err(SupervisorError::Handshake(error))
            }
        }
    }
}
