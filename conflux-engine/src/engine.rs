//! The execution engine: per-key caching plus call coalescing
//!
//! One engine wraps one registered function. Concurrent calls sharing a
//! cache key collapse onto a single leader execution; the leader's outcome
//! is fanned out verbatim to every caller. Only successful outcomes reach
//! the cache store, so a failed key retries on the next call. The
//! execute/settle/fan-out sequence runs in a task detached from any caller,
//! so a caller that disconnects mid-flight cannot leak the pending key.

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

use crate::error::{CallOutcome, EngineError};
use crate::handler::{FunctionSpec, Handler};
use crate::store::CacheStore;

/// Engine tuning knobs
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Optional guard against a handler that never completes. `None` means
    /// a pending key blocks its callers indefinitely.
    pub pending_timeout: Option<Duration>,
}

struct EngineState {
    cache: CacheStore,
    /// Key present iff a leader execution is in flight for it
    pending: HashMap<String, Vec<oneshot::Sender<CallOutcome>>>,
}

/// Execution engine for one named function
pub struct Engine {
    spec: FunctionSpec,
    config: EngineConfig,
    state: Arc<Mutex<EngineState>>,
}

impl Engine {
    pub fn new(spec: FunctionSpec) -> Self {
        Self::with_config(spec, EngineConfig::default())
    }

    pub fn with_config(spec: FunctionSpec, config: EngineConfig) -> Self {
        Self {
            spec,
            config,
            state: Arc::new(Mutex::new(EngineState {
                cache: CacheStore::new(),
                pending: HashMap::new(),
            })),
        }
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn spec(&self) -> &FunctionSpec {
        &self.spec
    }

    /// Invoke the wrapped function.
    ///
    /// Without a cache key every call executes the handler directly. With a
    /// key, a cached value short-circuits, an in-flight execution absorbs
    /// the call as a waiter, and otherwise this call claims the key and
    /// spawns the leader execution. Every caller, the claimant included,
    /// observes the outcome through a completion channel: the execution
    /// itself runs detached, so it settles the cache and releases the key
    /// even if the caller that started it goes away mid-flight.
    pub async fn call(&self, input: JsonValue, cache_key: Option<&str>) -> CallOutcome {
        if let Some(field) = self.spec.missing_field(&input) {
            return Err(EngineError::MissingField {
                field: field.to_string(),
            });
        }

        let key = match cache_key {
            Some(key) => key.to_string(),
            None => {
                return run_isolated(
                    self.spec.handler().clone(),
                    input,
                    self.config.pending_timeout,
                )
                .await
            }
        };

        let rx = {
            let mut state = self.state.lock().await;
            if let Some(value) = state.cache.get(&key) {
                debug!(function = %self.spec.name(), key = %key, "cache hit");
                return Ok(value);
            }

            let (tx, rx) = oneshot::channel();
            match state.pending.get_mut(&key) {
                Some(waiters) => {
                    waiters.push(tx);
                    debug!(
                        function = %self.spec.name(),
                        key = %key,
                        callers = waiters.len(),
                        "coalesced onto in-flight execution"
                    );
                }
                None => {
                    state.pending.insert(key.clone(), vec![tx]);
                    self.spawn_leader(key, input);
                }
            }
            rx
        };

        rx.await.unwrap_or_else(|_| {
            Err(EngineError::Internal(
                "execution task dropped without notifying callers".to_string(),
            ))
        })
    }

    /// Leader path, detached from every caller: execute, settle the cache,
    /// remove the pending key, fan the outcome out
    fn spawn_leader(&self, key: String, input: JsonValue) {
        let state = Arc::clone(&self.state);
        let handler = self.spec.handler().clone();
        let function = self.spec.name().to_string();
        let pending_timeout = self.config.pending_timeout;

        tokio::spawn(async move {
            let outcome = run_isolated(handler, input, pending_timeout).await;

            let waiters = {
                let mut state = state.lock().await;
                if let Ok(value) = &outcome {
                    state.cache.set(key.clone(), value.clone());
                }
                state.pending.remove(&key).unwrap_or_default()
            };

            match &outcome {
                Ok(_) => debug!(
                    function = %function,
                    key = %key,
                    callers = waiters.len(),
                    "execution completed; result cached"
                ),
                Err(error) => warn!(
                    function = %function,
                    key = %key,
                    callers = waiters.len(),
                    %error,
                    "execution failed; result not cached"
                ),
            }

            for waiter in waiters {
                // A caller that went away is not an error
                let _ = waiter.send(outcome.clone());
            }
        });
    }

    /// Explicit external invalidation: overwrite one cached slot
    pub async fn cache_set(&self, key: impl Into<String>, value: JsonValue) {
        self.state.lock().await.cache.set(key, value);
    }

    /// Explicit external invalidation: drop every cached slot
    pub async fn cache_clear(&self) {
        self.state.lock().await.cache.clear();
    }

    pub async fn cache_remove(&self, key: &str) -> Option<JsonValue> {
        self.state.lock().await.cache.remove(key)
    }

    pub async fn cache_len(&self) -> usize {
        self.state.lock().await.cache.len()
    }

    /// Number of keys with an in-flight leader execution
    pub async fn in_flight(&self) -> usize {
        self.state.lock().await.pending.len()
    }
}

/// Run the handler in its own task so a panic surfaces as a failure
/// outcome instead of a process fault
async fn run_isolated(
    handler: Handler,
    input: JsonValue,
    pending_timeout: Option<Duration>,
) -> CallOutcome {
    let task = tokio::spawn(async move {
        match handler {
            Handler::Sync(f) => f(input).map_err(EngineError::HandlerFailed),
            Handler::Async(f) => f(input).await.map_err(EngineError::HandlerFailed),
        }
    });

    let joined = match pending_timeout {
        Some(limit) => {
            let abort = task.abort_handle();
            match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    abort.abort();
                    return Err(EngineError::Timeout {
                        timeout_ms: limit.as_millis() as u64,
                    });
                }
            }
        }
        None => task.await,
    };

    match joined {
        Ok(outcome) => outcome,
        Err(join_error) if join_error.is_panic() => {
            let panic = join_error.into_panic();
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "opaque panic payload".to_string());
            Err(EngineError::HandlerPanicked(message))
        }
        Err(_) => Err(EngineError::Internal(
            "handler task was cancelled".to_string(),
        )),
    }
}
