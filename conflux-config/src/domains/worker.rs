//! Worker runtime configuration
//!
//! Functions are declared here: each entry binds a name to a builtin
//! handler together with its required input fields. Registration
//! invariants are enforced by `validate()` before a worker ever serves.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_delay_ms() -> u64 {
    25
}

/// Builtin handler bodies a function entry can bind to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinHandler {
    /// Returns the value of its `echo` field synchronously
    Echo,
    /// Returns the value of its `echo` field after `delay_ms`
    DelayedEcho,
    /// Adds numeric fields `a` and `b`
    Sum,
    /// Concatenates string fields `left` and `right`
    Concat,
}

/// One declared function registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionConfig {
    pub name: String,

    pub builtin: BuiltinHandler,

    /// Input fields that must be present; their absence is reported to the
    /// caller by name without invoking the handler
    #[serde(default)]
    pub required_fields: Vec<String>,

    /// Completion delay for `delayed_echo`
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

/// Worker runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port; 0 requests an OS-assigned port, and the resolved port
    /// is what the snapshot reports
    #[serde(default)]
    pub port: u16,

    /// Suppress all but error-level logging
    #[serde(default)]
    pub silent: bool,

    #[serde(default)]
    pub functions: Vec<FunctionConfig>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 0,
            silent: false,
            functions: Vec::new(),
        }
    }
}

impl WorkerConfig {
    /// Registration-time invariants: non-empty unique names, non-empty
    /// field names. Violations are fatal configuration errors.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "worker.host must not be empty".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for function in &self.functions {
            if function.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "function name must be a non-empty string".to_string(),
                ));
            }
            if !names.insert(function.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate function name '{}'",
                    function.name
                )));
            }
            for field in &function.required_fields {
                if field.trim().is_empty() {
                    return Err(ConfigError::ValidationError(format!(
                        "function '{}' declares an empty required field name",
                        function.name
                    )));
                }
            }
        }

        Ok(())
    }
}
