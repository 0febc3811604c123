//! Domain-specific configuration modules

pub mod supervisor;
pub mod worker;

use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use supervisor::SupervisorConfig;
use worker::WorkerConfig;

/// Root configuration object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfluxConfig {
    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

impl ConfluxConfig {
    /// Validate all domains
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.worker.validate()?;
        self.supervisor.validate()?;
        Ok(())
    }
}
