//! Control API over the supervisor
//!
//! Start/stop/status/shutdown routes. Every supervisor error maps to a
//! failure response; the supervisor process itself keeps running through
//! spawn failures and unknown-identity stops.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tracing::info;

use conflux_ipc::{AckResponse, StartRequest, StopRequest};

use crate::error::SupervisorError;
use crate::supervisor::Supervisor;

/// Build the control router
pub fn create_control_app(supervisor: Arc<Supervisor>) -> Router {
    Router::new()
        .route("/workers/start", post(start_worker))
        .route("/workers/stop", post(stop_worker))
        .route("/status", get(status))
        .route("/shutdown", post(shutdown))
        .with_state(supervisor)
}

fn failure(error: &SupervisorError) -> (StatusCode, Json<JsonValue>) {
    let status = match error {
        SupervisorError::NotRunning(_) => StatusCode::NOT_FOUND,
        SupervisorError::Identity(_) => StatusCode::BAD_REQUEST,
        SupervisorError::Spawn(_) | SupervisorError::Handshake(_) => StatusCode::BAD_GATEWAY,
        SupervisorError::Stop(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"error": error.to_string()})))
}

async fn start_worker(
    State(supervisor): State<Arc<Supervisor>>,
    Json(request): Json<StartRequest>,
) -> Result<Json<JsonValue>, (StatusCode, Json<JsonValue>)> {
    match supervisor.start(&request.config).await {
        Ok(response) => Ok(Json(serde_json::to_value(response).unwrap_or(JsonValue::Null))),
        Err(error) => Err(failure(&error)),
    }
}

async fn stop_worker(
    State(supervisor): State<Arc<Supervisor>>,
    Json(request): Json<StopRequest>,
) -> Result<Json<JsonValue>, (StatusCode, Json<JsonValue>)> {
    match supervisor.stop(&request.config, request.exit_if_last).await {
        Ok(response) => Ok(Json(serde_json::to_value(response).unwrap_or(JsonValue::Null))),
        Err(error) => Err(failure(&error)),
    }
}

async fn status(State(supervisor): State<Arc<Supervisor>>) -> Json<JsonValue> {
    let status = supervisor.status().await;
    Json(serde_json::to_value(status).unwrap_or(JsonValue::Null))
}

/// Acknowledge, then shut down. The acknowledgement reaches the caller
/// because the server drains in-flight requests before exiting.
async fn shutdown(State(supervisor): State<Arc<Supervisor>>) -> Json<AckResponse> {
    info!("shutdown requested through control API");
    supervisor.request_shutdown();
    Json(AckResponse {
        message: "supervisor shutting down".to_string(),
    })
}
