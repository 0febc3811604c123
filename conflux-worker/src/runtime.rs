//! Worker runtime lifecycle
//!
//! Binds the listener first so the snapshot carries the resolved port,
//! emits the stdout handshake line, then serves. Stdout carries nothing
//! but that single line; logging is initialized on stderr by the binary.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use conflux_config::WorkerConfig;
use conflux_ipc::{write_snapshot_line, WorkerSnapshot};

use crate::app::{create_app, AppState};
use crate::error::WorkerError;
use crate::registry::FunctionRegistry;

/// A bound, ready-to-serve worker
pub struct WorkerRuntime {
    registry: Arc<FunctionRegistry>,
    listener: TcpListener,
    snapshot: WorkerSnapshot,
}

impl WorkerRuntime {
    /// Build the registry and bind the listener.
    ///
    /// An operator-supplied `port_override` takes precedence over the
    /// configured port; either way the snapshot reports the port actually
    /// bound, so a requested port 0 resolves to the OS assignment.
    pub async fn bind(config: WorkerConfig, port_override: Option<u16>) -> Result<Self, WorkerError> {
        let registry = Arc::new(FunctionRegistry::from_config(&config)?);

        let port = port_override.unwrap_or(config.port);
        let listener = TcpListener::bind((config.host.as_str(), port)).await?;
        let resolved_port = listener.local_addr()?.port();

        let snapshot = WorkerSnapshot {
            host: config.host.clone(),
            port: resolved_port,
            functions: registry.function_names(),
            silent: config.silent,
            pid: std::process::id(),
        };

        info!(
            address = %snapshot.address(),
            functions = ?snapshot.functions,
            "worker bound"
        );

        Ok(Self {
            registry,
            listener,
            snapshot,
        })
    }

    pub fn snapshot(&self) -> &WorkerSnapshot {
        &self.snapshot
    }

    /// Emit the handshake line on stdout
    pub async fn emit_handshake(&self) -> Result<(), WorkerError> {
        let mut stdout = tokio::io::stdout();
        write_snapshot_line(&mut stdout, &self.snapshot).await?;
        Ok(())
    }

    /// Emit the handshake, then serve until the process is terminated
    pub async fn serve(self) -> Result<(), WorkerError> {
        let app = create_app(AppState {
            registry: self.registry.clone(),
            snapshot: self.snapshot.clone(),
        });

        self.emit_handshake().await?;
        info!(address = %self.snapshot.address(), "worker serving");

        axum::serve(self.listener, app).await?;
        Ok(())
    }
}
