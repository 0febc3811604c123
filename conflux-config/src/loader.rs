//! Configuration loading and environment variable handling

use std::path::Path;
use tracing::debug;

use crate::domains::ConfluxConfig;
use crate::error::{ConfigError, ConfigResult};

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with the default prefix
    pub fn new() -> Self {
        Self {
            prefix: "CONFLUX".to_string(),
        }
    }

    /// Create a new config loader with a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides.
    /// Validation failures are annotated with the offending file path.
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<ConfluxConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: ConfluxConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;

        config.validate_all().map_err(|e| ConfigError::SourceError {
            source_path: path.display().to_string(),
            message: e.to_string(),
        })?;

        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<ConfluxConfig> {
        let mut config = ConfluxConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<ConfluxConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut ConfluxConfig) -> ConfigResult<()> {
        if let Ok(host) = self.get_env_var("WORKER_HOST") {
            config.worker.host = host;
        }
        if let Ok(port) = self.get_env_var("WORKER_PORT") {
            config.worker.port = port
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("invalid WORKER_PORT: {}", e)))?;
        }
        if let Ok(silent) = self.get_env_var("WORKER_SILENT") {
            config.worker.silent = silent
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("invalid WORKER_SILENT: {}", e)))?;
        }
        if let Ok(host) = self.get_env_var("SUPERVISOR_HOST") {
            config.supervisor.host = host;
        }
        if let Ok(port) = self.get_env_var("SUPERVISOR_PORT") {
            config.supervisor.port = port
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("invalid SUPERVISOR_PORT: {}", e)))?;
        }
        if let Ok(timeout) = self.get_env_var("HANDSHAKE_TIMEOUT_MS") {
            config.supervisor.handshake_timeout_ms = timeout.parse().map_err(|e| {
                ConfigError::EnvError(format!("invalid HANDSHAKE_TIMEOUT_MS: {}", e))
            })?;
        }
        Ok(())
    }

    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
