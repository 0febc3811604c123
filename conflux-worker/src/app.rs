//! HTTP transport for the worker runtime
//!
//! Routes: `POST /call/{name}` to invoke a function, `GET /config` for the
//! snapshot, and an explicit cache invalidation surface. Every
//! request-triggered error becomes a failure response; nothing here can
//! crash the process.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::debug;

use conflux_engine::EngineError;
use conflux_ipc::{CallFailure, CallRequest, CallResponse, FailureCode, WorkerSnapshot};

use crate::registry::FunctionRegistry;

/// Shared state behind the worker routes
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<FunctionRegistry>,
    pub snapshot: WorkerSnapshot,
}

/// Build the worker router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/call/{name}", post(call_function))
        .route("/config", get(get_config))
        .route("/cache/{name}/clear", post(clear_cache))
        .route("/cache/{name}/{key}", put(set_cache))
        .with_state(state)
}

fn not_found(name: &str) -> CallFailure {
    CallFailure {
        code: FailureCode::NotFound,
        message: format!("unknown function '{}'", name),
        missing_field: None,
    }
}

/// Map an engine failure to a wire failure and HTTP status
fn engine_failure(error: &EngineError) -> (StatusCode, CallFailure) {
    let (status, code, missing_field) = match error {
        EngineError::MissingField { field } => (
            StatusCode::BAD_REQUEST,
            FailureCode::MissingField,
            Some(field.clone()),
        ),
        EngineError::HandlerFailed(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            FailureCode::HandlerFailed,
            None,
        ),
        EngineError::HandlerPanicked(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            FailureCode::HandlerPanicked,
            None,
        ),
        EngineError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, FailureCode::Timeout, None),
        EngineError::InvalidRegistration(_) | EngineError::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            FailureCode::Internal,
            None,
        ),
    };

    (
        status,
        CallFailure {
            code,
            message: error.to_string(),
            missing_field,
        },
    )
}

/// Invoke a registered function
async fn call_function(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<CallRequest>,
) -> (StatusCode, Json<CallResponse>) {
    let correlation_id = request.correlation_id;

    let Some(engine) = state.registry.get(&name) else {
        return (
            StatusCode::NOT_FOUND,
            Json(CallResponse::Error {
                error: not_found(&name),
                correlation_id,
            }),
        );
    };

    debug!(function = %name, cache_key = ?request.cache_key, "call received");
    match engine.call(request.data, request.cache_key.as_deref()).await {
        Ok(result) => (
            StatusCode::OK,
            Json(CallResponse::Ok {
                result,
                correlation_id,
            }),
        ),
        Err(error) => {
            let (status, failure) = engine_failure(&error);
            (
                status,
                Json(CallResponse::Error {
                    error: failure,
                    correlation_id,
                }),
            )
        }
    }
}

/// Report the effective configuration snapshot
async fn get_config(State(state): State<AppState>) -> Json<WorkerSnapshot> {
    Json(state.snapshot.clone())
}

/// Drop every cached result for one function
async fn clear_cache(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> (StatusCode, Json<JsonValue>) {
    match state.registry.get(&name) {
        Some(engine) => {
            engine.cache_clear().await;
            (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::to_value(not_found(&name)).unwrap_or(JsonValue::Null)),
        ),
    }
}

/// Overwrite one cached slot for a function
async fn set_cache(
    State(state): State<AppState>,
    Path((name, key)): Path<(String, String)>,
    Json(value): Json<JsonValue>,
) -> (StatusCode, Json<JsonValue>) {
    match state.registry.get(&name) {
        Some(engine) => {
            engine.cache_set(key, value).await;
            (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::to_value(not_found(&name)).unwrap_or(JsonValue::Null)),
        ),
    }
}
