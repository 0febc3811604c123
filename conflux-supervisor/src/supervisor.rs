//! Supervision logic: worker registry and self-lifecycle
//!
//! The registry maps configuration identity to one running worker. Starts
//! are idempotent per identity; stops remove the record after the process
//! exits. Auto-exit is signalled through a watch channel consumed by the
//! control server's graceful shutdown, so the triggering response is
//! flushed before the process goes down.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use conflux_config::canonical_identity;
use conflux_ipc::{StartResponse, StatusResponse, StopResponse, WorkerSnapshot, WorkerStatus};

use crate::error::SupervisorError;
use crate::spawner::{WorkerHandle, WorkerSpawner};

/// One supervised worker
struct WorkerRecord {
    snapshot: WorkerSnapshot,
    started_at: DateTime<Utc>,
    handle: Box<dyn WorkerHandle>,
}

/// Owns the worker registry and the supervisor's own lifecycle
pub struct Supervisor {
    spawner: Box<dyn WorkerSpawner>,
    registry: Mutex<HashMap<String, WorkerRecord>>,
    /// One lock per identity so only same-identity starts serialize; the
    /// registry lock is never held across a spawn
    start_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    shutdown: watch::Sender<bool>,
}

impl Supervisor {
    pub fn new(spawner: Box<dyn WorkerSpawner>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            spawner,
            registry: Mutex::new(HashMap::new()),
            start_locks: Mutex::new(HashMap::new()),
            shutdown,
        }
    }

    /// Start a worker from a configuration source.
    ///
    /// Idempotent per identity: if the derived identity already has a
    /// running record its snapshot is returned with `spawned: false` and no
    /// second process is created. Concurrent starts of one identity
    /// serialize on a per-identity lock; a slow spawn or handshake never
    /// blocks the registry for other operations.
    pub async fn start(&self, config_path: &str) -> Result<StartResponse, SupervisorError> {
        let id = canonical_identity(config_path)?;

        let identity_lock = {
            let mut locks = self.start_locks.lock().await;
            Arc::clone(locks.entry(id.clone()).or_default())
        };
        let _claimed = identity_lock.lock().await;

        if let Some(record) = self.registry.lock().await.get(&id) {
            info!(worker = %id, "start requested for running worker; reusing");
            return Ok(StartResponse {
                snapshot: record.snapshot.clone(),
                spawned: false,
            });
        }

        let spawned = self.spawner.spawn(config_path).await?;
        info!(
            worker = %id,
            address = %spawned.snapshot.address(),
            pid = spawned.snapshot.pid,
            "worker started"
        );

        let snapshot = spawned.snapshot.clone();
        self.registry.lock().await.insert(
            id,
            WorkerRecord {
                snapshot: spawned.snapshot,
                started_at: Utc::now(),
                handle: spawned.handle,
            },
        );

        Ok(StartResponse {
            snapshot,
            spawned: true,
        })
    }

    /// Stop a worker by configuration identity.
    ///
    /// Returns the snapshot that was on record. When `exit_if_last` is set
    /// and this stop empties the registry, supervisor shutdown is
    /// initiated; the caller's response is still delivered because the
    /// control server drains in-flight requests before exiting.
    pub async fn stop(
        &self,
        config_path: &str,
        exit_if_last: bool,
    ) -> Result<StopResponse, SupervisorError> {
        let id = canonical_identity(config_path)?;

        let mut registry = self.registry.lock().await;
        let mut record = registry
            .remove(&id)
            .ok_or_else(|| SupervisorError::NotRunning(id.clone()))?;

        if let Err(error) = record.handle.terminate().await {
            warn!(worker = %id, %error, "worker did not terminate cleanly");
        }
        let now_empty = registry.is_empty();
        drop(registry);

        info!(worker = %id, "worker stopped");
        if exit_if_last && now_empty {
            info!("last worker stopped with exit-if-last; initiating supervisor shutdown");
            self.request_shutdown();
        }

        Ok(StopResponse {
            snapshot: record.snapshot,
        })
    }

    /// Registry snapshot for observability
    pub async fn status(&self) -> StatusResponse {
        let registry = self.registry.lock().await;
        let mut workers: Vec<WorkerStatus> = registry
            .iter()
            .map(|(id, record)| WorkerStatus {
                id: id.clone(),
                snapshot: record.snapshot.clone(),
                started_at: record.started_at,
            })
            .collect();
        workers.sort_by(|a, b| a.id.cmp(&b.id));
        StatusResponse { workers }
    }

    pub async fn worker_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Signal supervisor shutdown
    pub fn request_shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Subscribe to the shutdown signal
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Whether shutdown has been requested
    pub fn shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[tokio::test]
    async fn test_start_is_idempotent_per_identity() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_file(&dir, "a.yaml");

        let spawner = FakeSpawner::new();
        let spawn_count = spawner.spawn_count.clone();
        let supervisor = Supervisor::new(Box::new(spawner));

        let first = supervisor.start(&config).await.unwrap();
        assert!(first.spawned);

        let second = supervisor.start(&config).await.unwrap();
        assert!(!second.spawned);
        assert_eq!(second.snapshot, first.snapshot);
        assert_eq!(spawn_count.load(Ordering::SeqCst), 1);
        assert_eq!(supervisor.worker_count().await, 1);
    }

    #[tokio::test]
    async fn test_relative_path_maps_to_same_identity() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_file(&dir, "a.yaml");
        let indirect = format!("{}/./a.yaml", dir.path().display());

        let supervisor = Supervisor::new(Box::new(FakeSpawner::new()));
        supervisor.start(&config).await.unwrap();
        let second = supervisor.start(&indirect).await.unwrap();
        assert!(!second.spawned);
    }

    #[tokio::test]
    async fn test_distinct_configs_spawn_distinct_workers() {
        let dir = tempfile::tempdir().unwrap();
        let config_a = config_file(&dir, "a.yaml");
        let config_b = config_file(&dir, "b.yaml");

        let supervisor = Supervisor::new(Box::new(FakeSpawner::new()));
        assert!(supervisor.start(&config_a).await.unwrap().spawned);
        assert!(supervisor.start(&config_b).await.unwrap().spawned);
        assert_eq!(supervisor.worker_count().await, 2);
    }

    #[tokio::test]
    async fn test_stop_unknown_identity_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_file(&dir, "a.yaml");

        let supervisor = Supervisor::new(Box::new(FakeSpawner::new()));
        let result = supervisor.stop(&config, false).await;
        assert!(matches!(result, Err(SupervisorError::NotRunning(_))));
    }

    #[tokio::test]
    async fn test_stop_terminates_and_returns_recorded_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_file(&dir, "a.yaml");

        let spawner = FakeSpawner::new();
        let terminated = spawner.terminated.clone();
        let supervisor = Supervisor::new(Box::new(spawner));

        let started = supervisor.start(&config).await.unwrap();
        let stopped = supervisor.stop(&config, false).await.unwrap();

        assert_eq!(stopped.snapshot, started.snapshot);
        assert!(terminated.load(Ordering::SeqCst));
        assert_eq!(supervisor.worker_count().await, 0);
        // Plain stop never triggers auto-exit, even when it empties the registry
        assert!(!supervisor.shutting_down());
    }

    #[tokio::test]
    async fn test_exit_if_last_triggers_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_file(&dir, "a.yaml");

        let supervisor = Supervisor::new(Box::new(FakeSpawner::new()));
        let mut signal = supervisor.shutdown_signal();

        supervisor.start(&config).await.unwrap();
        supervisor.stop(&config, true).await.unwrap();

        assert!(supervisor.shutting_down());
        assert!(*signal.borrow_and_update());
    }

    #[tokio::test]
    async fn test_exit_if_last_ignored_when_workers_remain() {
        let dir = tempfile::tempdir().unwrap();
        let config_a = config_file(&dir, "a.yaml");
        let config_b = config_file(&dir, "b.yaml");

        let supervisor = Supervisor::new(Box::new(FakeSpawner::new()));
        supervisor.start(&config_a).await.unwrap();
        supervisor.start(&config_b).await.unwrap();

        supervisor.stop(&config_a, true).await.unwrap();
        assert!(!supervisor.shutting_down());
        assert_eq!(supervisor.worker_count().await, 1);
    }

    #[tokio::test]
    async fn test_failed_spawn_leaves_registry_clean() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_file(&dir, "a.yaml");

        let supervisor = Supervisor::new(Box::new(FailingSpawner));
        let result = supervisor.start(&config).await;
        assert!(matches!(result, Err(SupervisorError::Handshake(_))));
        assert_eq!(supervisor.worker_count().await, 0);
    }

    #[tokio::test]
    async fn test_status_lists_workers_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let config_b = config_file(&dir, "b.yaml");
        let config_a = config_file(&dir, "a.yaml");

        let supervisor = Supervisor::new(Box::new(FakeSpawner::new()));
        supervisor.start(&config_b).await.unwrap();
        supervisor.start(&config_a).await.unwrap();

        let status = supervisor.status().await;
        assert_eq!(status.workers.len(), 2);
        assert!(status.workers[0].id < status.workers[1].id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_spawn_does_not_block_other_operations() {
        let dir = tempfile::tempdir().unwrap();
        let config_a = config_file(&dir, "a.yaml");
        let config_b = config_file(&dir, "b.yaml");

        let (gate, spawner) = GatedSpawner::new();
        let supervisor = Arc::new(Supervisor::new(Box::new(spawner)));

        let starter = {
            let supervisor = supervisor.clone();
            let config = config_a.clone();
            tokio::spawn(async move { supervisor.start(&config).await })
        };
        tokio::task::yield_now().await;

        // Registry operations answer while the spawn is still parked
        let status = tokio::time::timeout(Duration::from_secs(1), supervisor.status())
            .await
            .expect("status blocked behind an in-flight spawn");
        assert!(status.workers.is_empty());

        let stopped =
            tokio::time::timeout(Duration::from_secs(1), supervisor.stop(&config_b, false))
                .await
                .expect("stop blocked behind an in-flight spawn");
        assert!(matches!(stopped, Err(SupervisorError::NotRunning(_))));

        gate.send(true).unwrap();
        assert!(starter.await.unwrap().unwrap().spawned);
        assert_eq!(supervisor.worker_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_same_identity_starts_spawn_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_file(&dir, "a.yaml");

        let (gate, spawner) = GatedSpawner::new();
        let spawn_count = spawner.inner.spawn_count.clone();
        let supervisor = Arc::new(Supervisor::new(Box::new(spawner)));

        let first = {
            let supervisor = supervisor.clone();
            let config = config.clone();
            tokio::spawn(async move { supervisor.start(&config).await })
        };
        tokio::task::yield_now().await;

        let second = {
            let supervisor = supervisor.clone();
            let config = config.clone();
            tokio::spawn(async move { supervisor.start(&config).await })
        };
        tokio::task::yield_now().await;

        gate.send(true).unwrap();
        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        assert!(first.spawned);
        assert!(!second.spawned);
        assert_eq!(second.snapshot, first.snapshot);
        assert_eq!(spawn_count.load(Ordering::SeqCst), 1);
        assert_eq!(supervisor.worker_count().await, 1);
    }

    #[tokio::test]
    async fn test_missing_config_source_is_identity_error() {
        let supervisor = Supervisor::new(Box::new(FakeSpawner::new()));
        let result = supervisor.start("/no/such/config.yaml").await;
        assert!(matches!(result, Err(SupervisorError::Identity(_))));
    }
}
