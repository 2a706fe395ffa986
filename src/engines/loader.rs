//! Engine loader for initializing engines from configuration

use super::http::HttpEngine;
use super::registry::EngineRegistry;
use super::traits::Engine;
use super::{duckduckgo, qwant, searxng, wikidata, wikipedia};
use crate::config::{EngineConfig, Settings};
use crate::network::HttpClient;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing engines from configuration
pub struct EngineLoader;

impl EngineLoader {
    /// Load all enabled engines from settings, in configured order
    pub fn load(settings: &Settings, client: &HttpClient) -> Result<EngineRegistry> {
        let mut registry = EngineRegistry::new();

        for config in &settings.engines {
            if config.disabled {
                info!("Skipping disabled engine: {}", config.name);
                continue;
            }

            match Self::create_engine(&config.engine, config) {
                Ok(engine) => {
                    info!("Loaded engine: {} ({})", config.name, config.engine);
                    let adapter = HttpEngine::new(config.name.clone(), engine, client.clone());
                    registry.register(Arc::new(adapter), config.clone());
                }
                Err(e) => {
                    warn!("Failed to load engine {}: {}", config.name, e);
                }
            }
        }

        if registry.is_empty() {
            anyhow::bail!("no search engines could be loaded");
        }

        info!("Loaded {} engines", registry.len());
        Ok(registry)
    }

    /// Create an engine instance by adapter type
    fn create_engine(engine_type: &str, config: &EngineConfig) -> Result<Box<dyn Engine>> {
        let mut engine: Box<dyn Engine> = match engine_type {
            "wikipedia" => Box::new(wikipedia::Wikipedia::new()),
            "wikidata" => Box::new(wikidata::Wikidata::new()),
            "searxng" => Box::new(searxng::SearXNG::new()),
            "duckduckgo" => Box::new(duckduckgo::DuckDuckGo::new()),
            "qwant" => Box::new(qwant::Qwant::new()),
            _ => {
                return Err(anyhow::anyhow!("Unknown engine type: {}", engine_type));
            }
        };

        engine.init(config)?;

        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        let settings = Settings::default();
        let client = HttpClient::new().unwrap();
        let registry = EngineLoader::load(&settings, &client).unwrap();

        assert_eq!(
            registry.names(),
            vec!["wikipedia", "wikidata", "searxng", "duckduckgo", "qwant"]
        );
    }

    #[test]
    fn test_skips_unknown_and_disabled() {
        let mut settings = Settings::default();
        settings.engines = vec![
            EngineConfig::new("wikipedia", 1.0),
            EngineConfig::new("google", 1.0),
            EngineConfig {
                disabled: true,
                ..EngineConfig::new("qwant", 0.4)
            },
        ];
        let client = HttpClient::new().unwrap();
        let registry = EngineLoader::load(&settings, &client).unwrap();

        assert_eq!(registry.names(), vec!["wikipedia"]);
    }

    #[test]
    fn test_instance_name_differs_from_type() {
        let mut settings = Settings::default();
        settings.engines = vec![EngineConfig {
            name: "searx-local".to_string(),
            base_url: Some("http://localhost:8888".to_string()),
            ..EngineConfig::new("searxng", 0.6)
        }];
        let client = HttpClient::new().unwrap();
        let registry = EngineLoader::load(&settings, &client).unwrap();

        assert_eq!(registry.names(), vec!["searx-local"]);
    }

    #[test]
    fn test_nothing_loadable_is_an_error() {
        let mut settings = Settings::default();
        settings.engines = vec![EngineConfig::new("altavista", 1.0)];
        let client = HttpClient::new().unwrap();
        assert!(EngineLoader::load(&settings, &client).is_err());
    }
}
