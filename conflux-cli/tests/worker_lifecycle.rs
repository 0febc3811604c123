//! End-to-end lifecycle of a supervised worker process
//!
//! Spawns the real binary through the production spawner, exercises the
//! call surface over HTTP, and checks that a stopped worker's address
//! refuses connections at the transport level rather than answering with
//! an application failure.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use conflux_supervisor::{ProcessSpawner, Supervisor};
use serde_json::json;

fn worker_config(dir: &tempfile::TempDir) -> String {
    let path = dir.path().join("worker.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        concat!(
            "worker:\n",
            "  host: 127.0.0.1\n",
            "  port: 0\n",
            "  functions:\n",
            "    - name: echo\n",
            "      builtin: echo\n",
            "      required_fields: [echo]\n",
        )
    )
    .unwrap();
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_stopped_worker_address_refuses_connections() {
    let dir = tempfile::tempdir().unwrap();
    let config = worker_config(&dir);

    let spawner = ProcessSpawner::new(
        PathBuf::from(env!("CARGO_BIN_EXE_conflux")),
        Duration::from_secs(10),
    );
    let supervisor = Supervisor::new(Box::new(spawner));

    let started = supervisor.start(&config).await.unwrap();
    assert!(started.spawned);
    assert_ne!(started.snapshot.port, 0);
    let url = format!("http://{}/call/echo", started.snapshot.address());

    // The running worker serves calls
    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .json(&json!({"data": {"echo": "x"}}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["result"], "x");

    let stopped = supervisor.stop(&config, false).await.unwrap();
    assert_eq!(stopped.snapshot.port, started.snapshot.port);

    // The same address now fails before any response is produced, which a
    // caller can tell apart from an application failure body
    let error = client
        .post(&url)
        .json(&json!({"data": {"echo": "x"}}))
        .send()
        .await
        .expect_err("stopped worker still accepting connections");
    assert!(error.is_connect());
}
