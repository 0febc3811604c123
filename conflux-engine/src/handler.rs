//! Named function registrations with declared capabilities
//!
//! A function states up front which input fields it requires and whether it
//! completes synchronously or through a future. Both are verified and
//! normalized at registration time; nothing is inferred at call time.

use futures::future::BoxFuture;
use serde_json::Value as JsonValue;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::{EngineError, EngineResult};

/// A synchronous handler body: completes on return
pub type SyncHandlerFn = dyn Fn(JsonValue) -> Result<JsonValue, String> + Send + Sync;

/// An asynchronous handler body: completes via its future at an arbitrary
/// later time on the same scheduler
pub type AsyncHandlerFn =
    dyn Fn(JsonValue) -> BoxFuture<'static, Result<JsonValue, String>> + Send + Sync;

/// Handler capability, declared at registration
#[derive(Clone)]
pub enum Handler {
    Sync(Arc<SyncHandlerFn>),
    Async(Arc<AsyncHandlerFn>),
}

impl Handler {
    /// Wrap a synchronous closure
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(JsonValue) -> Result<JsonValue, String> + Send + Sync + 'static,
    {
        Handler::Sync(Arc::new(f))
    }

    /// Wrap an asynchronous closure
    pub fn async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(JsonValue) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<JsonValue, String>> + Send + 'static,
    {
        Handler::Async(Arc::new(move |input| Box::pin(f(input))))
    }

    /// Whether the handler completes synchronously
    pub fn is_sync(&self) -> bool {
        matches!(self, Handler::Sync(_))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Sync(_) => f.write_str("Handler::Sync"),
            Handler::Async(_) => f.write_str("Handler::Async"),
        }
    }
}

/// A validated named function registration
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    name: String,
    required_fields: Vec<String>,
    handler: Handler,
}

impl FunctionSpec {
    /// Create a registration, enforcing construction-time invariants:
    /// non-empty name, non-empty field names, no duplicate fields.
    pub fn new(
        name: impl Into<String>,
        required_fields: Vec<String>,
        handler: Handler,
    ) -> EngineResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EngineError::InvalidRegistration(
                "function name must be a non-empty string".to_string(),
            ));
        }

        for field in &required_fields {
            if field.trim().is_empty() {
                return Err(EngineError::InvalidRegistration(format!(
                    "function '{}' declares an empty required field name",
                    name
                )));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for field in &required_fields {
            if !seen.insert(field.as_str()) {
                return Err(EngineError::InvalidRegistration(format!(
                    "function '{}' declares duplicate required field '{}'",
                    name, field
                )));
            }
        }

        Ok(Self {
            name,
            required_fields,
            handler,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required_fields
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Return the first declared field absent from `input`, if any
    pub fn missing_field(&self, input: &JsonValue) -> Option<&str> {
        if self.required_fields.is_empty() {
            return None;
        }
        match input.as_object() {
            Some(map) => self
                .required_fields
                .iter()
                .find(|field| !map.contains_key(field.as_str()))
                .map(|s| s.as_str()),
            // Non-object payloads cannot carry any field
            None => Some(self.required_fields[0].as_str()),
        }
    }
}
