//! Protocol message definitions
//!
//! Every message crossing a process boundary is JSON. The handshake payload
//! travels inside a versioned [`Envelope`]; the HTTP control and call
//! surfaces use the request/response structs directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Protocol version for compatibility checking across mixed deployments
pub const PROTOCOL_VERSION: u32 = 1;

/// Versioned envelope for stream-framed messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub protocol_version: u32,
    pub timestamp: DateTime<Utc>,
    pub message: T,
}

impl<T> Envelope<T> {
    pub fn new(message: T) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            timestamp: Utc::now(),
            message,
        }
    }

    pub fn is_compatible(&self) -> bool {
        self.protocol_version == PROTOCOL_VERSION
    }
}

/// A worker's effective configuration, reported through the handshake.
///
/// `port` is the resolved bound port, not the configured one, so a
/// requested ephemeral port (0) is reported as the actual assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    pub host: String,
    pub port: u16,
    pub functions: Vec<String>,
    pub silent: bool,
    pub pid: u32,
}

impl WorkerSnapshot {
    /// Address the worker is serving on
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Request to invoke a registered function on a worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    #[serde(default)]
    pub data: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

/// Failure classification for call responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    NotFound,
    MissingField,
    HandlerFailed,
    HandlerPanicked,
    Timeout,
    Internal,
}

/// Failure description relayed to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFailure {
    pub code: FailureCode,
    pub message: String,
    /// Set when `code` is `missing_field`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_field: Option<String>,
}

/// Outcome of a function invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallResponse {
    Ok {
        result: JsonValue,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correlation_id: Option<Uuid>,
    },
    Error {
        error: CallFailure,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correlation_id: Option<Uuid>,
    },
}

/// Control API: start a worker from a configuration source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    pub config: String,
}

/// Control API: start outcome; `spawned` is false when an already-running
/// worker with the same identity was reused
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartResponse {
    pub snapshot: WorkerSnapshot,
    pub spawned: bool,
}

/// Control API: stop a worker by configuration source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopRequest {
    pub config: String,
    /// Shut the supervisor down if this stop empties the registry
    #[serde(default)]
    pub exit_if_last: bool,
}

/// Control API: stop outcome carrying the snapshot that was on record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopResponse {
    pub snapshot: WorkerSnapshot,
}

/// One registry entry in a status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub id: String,
    pub snapshot: WorkerSnapshot,
    pub started_at: DateTime<Utc>,
}

/// Control API: registry snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub workers: Vec<WorkerStatus>,
}

/// Control API: acknowledgement for self-stop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_version() {
        let envelope = Envelope::new(WorkerSnapshot {
            host: "127.0.0.1".to_string(),
            port: 4100,
            functions: vec!["echo".to_string()],
            silent: false,
            pid: 42,
        });
        assert_eq!(envelope.protocol_version, PROTOCOL_VERSION);
        assert!(envelope.is_compatible());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let snapshot = WorkerSnapshot {
            host: "0.0.0.0".to_string(),
            port: 58231,
            functions: vec!["echo".to_string(), "sum".to_string()],
            silent: true,
            pid: 9001,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: WorkerSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(back.address(), "0.0.0.0:58231");
    }

    #[test]
    fn test_call_request_defaults() {
        let request: CallRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.data, JsonValue::Null);
        assert_eq!(request.cache_key, None);
        assert_eq!(request.correlation_id, None);
    }

    #[test]
    fn test_call_response_tagging() {
        let ok = CallResponse::Ok {
            result: json!("x"),
            correlation_id: None,
        };
        let text = serde_json::to_string(&ok).unwrap();
        assert!(text.contains("\"status\":\"ok\""));

        let err = CallResponse::Error {
            error: CallFailure {
                code: FailureCode::MissingField,
                message: "missing required field: echo".to_string(),
                missing_field: Some("echo".to_string()),
            },
            correlation_id: None,
        };
        let text = serde_json::to_string(&err).unwrap();
        assert!(text.contains("\"status\":\"error\""));
        assert!(text.contains("\"missing_field\":\"echo\""));
    }

    #[test]
    fn test_stop_request_flag_defaults_off() {
        let request: StopRequest =
            serde_json::from_str(r#"{"config": "/etc/conflux/a.yaml"}"#).unwrap();
        assert!(!request.exit_if_last);
    }
}
