//! Application state shared across handlers

use crate::assist::{LanguageModel, Ollama};
use crate::config::Settings;
use crate::engines::EngineRegistry;
use crate::gateway::SearchGateway;
use crate::network::HttpClient;
use std::sync::Arc;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Engine registry
    pub registry: Arc<EngineRegistry>,
    /// Search pipeline
    pub gateway: Arc<SearchGateway>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, registry: EngineRegistry, client: HttpClient) -> Self {
        let registry = Arc::new(registry);
        let assist = if settings.assist.enabled {
            info!(
                "Language-model assist enabled ({} at {})",
                settings.assist.model, settings.assist.host
            );
            Some(Arc::new(Ollama::from_settings(&settings.assist, client)) as Arc<dyn LanguageModel>)
        } else {
            None
        };
        let gateway = SearchGateway::from_settings(&settings, registry.clone(), assist);

        Self::with_gateway(settings, registry, gateway)
    }

    /// Assemble state around an existing gateway
    pub fn with_gateway(
        settings: Settings,
        registry: Arc<EngineRegistry>,
        gateway: SearchGateway,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            registry,
            gateway: Arc::new(gateway),
        }
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
