//! Handler lookup by stage name.

use super::{NoOpStage, StageHandler};
use crate::config::PipelineConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// Handlers keyed by the stage name they serve.
#[derive(Debug, Clone, Default)]
pub struct StageRegistry {
    handlers: HashMap<String, Arc<dyn StageHandler>>,
}

impl StageRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with a pass-through [`NoOpStage`] for every stage
    /// in `config`.
    #[must_use]
    pub fn pass_through(config: &PipelineConfig) -> Self {
        config
            .stages
            .iter()
            .fold(Self::new(), |registry, stage| {
                registry.with_handler(NoOpStage::new(stage.name.clone()))
            })
    }

    /// Registers a handler under its own name, replacing any previous one.
    pub fn register(&mut self, handler: impl StageHandler + 'static) {
        self.register_arc(Arc::new(handler));
    }

    /// Registers a shared handler under its own name.
    pub fn register_arc(&mut self, handler: Arc<dyn StageHandler>) {
        self.handlers.insert(handler.name().to_string(), handler);
    }

    /// Registers a handler, builder style.
    #[must_use]
    pub fn with_handler(mut self, handler: impl StageHandler + 'static) -> Self {
        self.register(handler);
        self
    }

    /// Returns the handler for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn StageHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Returns true if a handler is registered for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::StageDefinition;

    #[test]
    fn test_register_and_lookup() {
        let registry = StageRegistry::new()
            .with_handler(NoOpStage::new("Validate"))
            .with_handler(NoOpStage::new("Discover"));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("Discover"));
        assert_eq!(registry.get("Validate").map(|h| h.name().to_string()), Some("Validate".to_string()));
        assert!(registry.get("Transfer").is_none());
        assert_eq!(registry.names(), vec!["Discover", "Validate"]);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = StageRegistry::new();
        registry.register(NoOpStage::new("Discover"));
        registry.register(NoOpStage::new("Discover"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_pass_through_covers_configured_stages() {
        let config = PipelineConfig::new("compliance")
            .with_stage(StageDefinition::new(10, "Discover"))
            .with_stage(StageDefinition::new(20, "Validate"));

        let registry = StageRegistry::pass_through(&config);

        assert_eq!(registry.names(), vec!["Discover", "Validate"]);
    }
}
