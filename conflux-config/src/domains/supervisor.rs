//! Supervisor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_handshake_timeout_ms() -> u64 {
    10_000
}

/// Supervisor process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Control API listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// How long to wait for a spawned worker's handshake line
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
        }
    }
}

impl SupervisorConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "supervisor.host must not be empty".to_string(),
            ));
        }
        if self.handshake_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "supervisor.handshake_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
