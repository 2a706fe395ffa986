//! Engine registry for managing configured search adapters

use super::table::EngineTable;
use super::traits::SearchAdapter;
use crate::config::EngineConfig;
use std::sync::Arc;
use std::time::Duration;

/// One registered adapter and its configuration
#[derive(Clone)]
pub struct RegisteredEngine {
    pub adapter: Arc<dyn SearchAdapter>,
    pub config: EngineConfig,
}

impl RegisteredEngine {
    pub fn name(&self) -> &str {
        self.adapter.name()
    }
}

/// Ordered, read-only set of adapters shared by all sessions
///
/// Registration order is the engine priority order.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    engines: Vec<RegisteredEngine>,
}

impl EngineRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any previous one with the same name
    pub fn register(&mut self, adapter: Arc<dyn SearchAdapter>, config: EngineConfig) {
        let entry = RegisteredEngine { adapter, config };
        let position = self.engines.iter().position(|e| e.name() == entry.name());
        match position {
            Some(idx) => self.engines[idx] = entry,
            None => self.engines.push(entry),
        }
    }

    /// Get an adapter by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn SearchAdapter>> {
        self.engines
            .iter()
            .find(|e| e.name() == name)
            .map(|e| &e.adapter)
    }

    /// Get engine config
    pub fn get_config(&self, name: &str) -> Option<&EngineConfig> {
        self.engines
            .iter()
            .find(|e| e.name() == name)
            .map(|e| &e.config)
    }

    /// Engine names in priority order
    pub fn names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    /// Iterate registered engines in priority order
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredEngine> {
        self.engines.iter()
    }

    /// Check if an engine exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get number of registered engines
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Effective per-call timeout for an engine
    pub fn timeout(&self, name: &str, default: Duration) -> Duration {
        self.get_config(name)
            .and_then(|c| c.timeout)
            .map(Duration::from_secs_f64)
            .unwrap_or(default)
    }

    /// Concurrent call cap for an engine within one session
    pub fn max_concurrency(&self, name: &str) -> Option<usize> {
        self.get_config(name).and_then(|c| c.max_concurrency)
    }

    /// Authority weights in priority order
    pub fn table(&self) -> EngineTable {
        EngineTable::new(
            self.engines
                .iter()
                .map(|e| (e.name().to_string(), e.config.weight)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{EngineError, EngineResult};
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl SearchAdapter for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn search(
            &self,
            _sub_query: &str,
            _max_results: usize,
            _timeout: Duration,
        ) -> Result<Vec<EngineResult>, EngineError> {
            Ok(vec![])
        }
    }

    fn registry() -> EngineRegistry {
        let mut registry = EngineRegistry::new();
        registry.register(Arc::new(Named("wikipedia")), EngineConfig::new("wikipedia", 1.0));
        registry.register(
            Arc::new(Named("qwant")),
            EngineConfig {
                timeout: Some(3.0),
                max_concurrency: Some(2),
                ..EngineConfig::new("qwant", 0.4)
            },
        );
        registry
    }

    #[test]
    fn test_registry_order() {
        let registry = registry();
        assert_eq!(registry.names(), vec!["wikipedia", "qwant"]);
        assert!(registry.contains("qwant"));
        assert!(!registry.contains("google"));
    }

    #[test]
    fn test_reregister_keeps_position() {
        let mut registry = registry();
        registry.register(Arc::new(Named("wikipedia")), EngineConfig::new("wikipedia", 2.0));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names()[0], "wikipedia");
        assert_eq!(registry.get_config("wikipedia").unwrap().weight, 2.0);
    }

    #[test]
    fn test_effective_settings() {
        let registry = registry();
        let default = Duration::from_secs(15);
        assert_eq!(registry.timeout("wikipedia", default), default);
        assert_eq!(registry.timeout("qwant", default), Duration::from_secs(3));
        assert_eq!(registry.max_concurrency("qwant"), Some(2));
        assert_eq!(registry.max_concurrency("wikipedia"), None);
    }

    #[test]
    fn test_table_follows_registration() {
        let table = registry().table();
        assert_eq!(table.priority("wikipedia"), 0);
        assert_eq!(table.priority("qwant"), 1);
        assert_eq!(table.weight("qwant"), 0.4);
    }
}
