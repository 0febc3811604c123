//! Conflux binary
//!
//! One executable, three modes: `worker` serves a function registry and
//! emits the stdout handshake, `supervisor` runs the control plane (and
//! respawns this same executable for its workers), `control` is a client
//! for the control API.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use conflux_config::ConfigLoader;
use conflux_ipc::{StartRequest, StopRequest};
use conflux_supervisor::{create_control_app, ProcessSpawner, Supervisor};
use conflux_worker::WorkerRuntime;

mod cli;
use cli::{Cli, Commands, ControlCommands};

/// Logging goes to stderr only; stdout is reserved for the handshake line
fn init_tracing(silent: bool) {
    let default = if silent { "error" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Worker {
            config,
            port,
            print_config,
            silent,
        } => run_worker(config, port, print_config, silent).await,
        Commands::Supervisor { config, bind } => run_supervisor(config, bind).await,
        Commands::Control { url, command } => run_control(&url, command).await,
    }
}

async fn run_worker(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    print_config: bool,
    silent: bool,
) -> Result<()> {
    let mut config = ConfigLoader::new()
        .load(config_path.as_deref())
        .context("failed to load worker configuration")?;

    // The operator flag wins and is reflected in the snapshot
    if silent {
        config.worker.silent = true;
    }
    init_tracing(config.worker.silent);

    let runtime = WorkerRuntime::bind(config.worker, port)
        .await
        .context("failed to start worker runtime")?;

    if print_config {
        runtime.emit_handshake().await?;
        return Ok(());
    }

    runtime.serve().await?;
    Ok(())
}

async fn run_supervisor(config_path: Option<PathBuf>, bind: Option<String>) -> Result<()> {
    let config = ConfigLoader::new()
        .load(config_path.as_deref())
        .context("failed to load supervisor configuration")?;
    init_tracing(false);

    let spawner = ProcessSpawner::from_current_exe(config.supervisor.handshake_timeout())
        .context("failed to locate the worker executable")?;
    let supervisor = Arc::new(Supervisor::new(Box::new(spawner)));

    let bind_address = bind.unwrap_or_else(|| config.supervisor.bind_address());
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind control API on {}", bind_address))?;
    info!(address = %bind_address, "supervisor control API listening");

    let app = create_control_app(supervisor.clone());
    let mut shutdown = supervisor.shutdown_signal();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|requested| *requested).await;
        })
        .await?;

    info!("supervisor exited");
    Ok(())
}

async fn run_control(base_url: &str, command: ControlCommands) -> Result<()> {
    let client = reqwest::Client::new();

    let body = match command {
        ControlCommands::Start { config } => {
            let request = StartRequest {
                config: resolve_config_arg(&config)?,
            };
            send(client.post(format!("{}/workers/start", base_url)).json(&request)).await?
        }
        ControlCommands::Stop {
            config,
            exit_if_last,
        } => {
            let request = StopRequest {
                config: resolve_config_arg(&config)?,
                exit_if_last,
            };
            send(client.post(format!("{}/workers/stop", base_url)).json(&request)).await?
        }
        ControlCommands::Status => send(client.get(format!("{}/status", base_url))).await?,
        ControlCommands::Shutdown => send(client.post(format!("{}/shutdown", base_url))).await?,
    };

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// The supervisor resolves identities against its own working directory,
/// so hand it an absolute path
fn resolve_config_arg(path: &Path) -> Result<String> {
    let canonical = std::fs::canonicalize(path)
        .with_context(|| format!("configuration file not found: {}", path.display()))?;
    Ok(canonical.to_string_lossy().into_owned())
}

/// Issue a control request, keeping transport failures distinguishable
/// from application-level failure responses
async fn send(builder: reqwest::RequestBuilder) -> Result<JsonValue> {
    let response = builder
        .send()
        .await
        .context("could not reach the supervisor (is it running?)")?;

    let status = response.status();
    let body: JsonValue = response.json().await.unwrap_or(JsonValue::Null);

    if !status.is_success() {
        let message = body["error"].as_str().unwrap_or("unknown error");
        bail!("control request failed ({}): {}", status, message);
    }
    Ok(body)
}
