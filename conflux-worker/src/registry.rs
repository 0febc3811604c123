//! Named-function registry
//!
//! Built once at startup from validated configuration and immutable
//! thereafter; each function owns its execution engine, so caches and
//! pending registries never leak across functions.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use conflux_config::WorkerConfig;
use conflux_engine::{Engine, FunctionSpec};

use crate::builtins;
use crate::error::WorkerError;

/// Registry mapping function names to their execution engines
#[derive(Default)]
pub struct FunctionRegistry {
    engines: HashMap<String, Arc<Engine>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one function; duplicate names are a fatal startup error
    pub fn register(&mut self, spec: FunctionSpec) -> Result<(), WorkerError> {
        let name = spec.name().to_string();
        if self.engines.contains_key(&name) {
            return Err(WorkerError::DuplicateFunction(name));
        }
        info!(function = %name, fields = ?spec.required_fields(), "function registered");
        self.engines.insert(name, Arc::new(Engine::new(spec)));
        Ok(())
    }

    /// Build the registry from declared configuration entries
    pub fn from_config(config: &WorkerConfig) -> Result<Self, WorkerError> {
        let mut registry = Self::new();
        for function in &config.functions {
            registry.register(builtins::build_spec(function)?)?;
        }
        if registry.is_empty() {
            warn!("worker starting with no registered functions");
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Engine>> {
        self.engines.get(name).cloned()
    }

    /// Registered identifiers, sorted for a deterministic snapshot
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflux_engine::Handler;

    fn spec(name: &str) -> FunctionSpec {
        FunctionSpec::new(name, vec![], Handler::sync(|input| Ok(input))).unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = FunctionRegistry::new();
        registry.register(spec("echo")).unwrap();

        assert!(registry.get("echo").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = FunctionRegistry::new();
        registry.register(spec("echo")).unwrap();
        let result = registry.register(spec("echo"));
        assert!(matches!(result, Err(WorkerError::DuplicateFunction(_))));
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = FunctionRegistry::new();
        registry.register(spec("zeta")).unwrap();
        registry.register(spec("alpha")).unwrap();
        assert_eq!(registry.function_names(), vec!["alpha", "zeta"]);
    }
}
