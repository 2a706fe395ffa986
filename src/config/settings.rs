//! Settings structures for nexus-search configuration

use crate::results::ScoreBreakdown;
use crate::{DEFAULT_ENGINE_TIMEOUT, DEFAULT_SESSION_TIMEOUT, MAX_QUERY_LENGTH, MAX_SUB_QUERIES};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Errors raised while loading or validating settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Main settings structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
    pub assist: AssistSettings,
    pub engines: Vec<EngineConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            server: ServerSettings::default(),
            search: SearchSettings::default(),
            outgoing: OutgoingSettings::default(),
            assist: AssistSettings::default(),
            engines: default_engines(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Merge with environment variables (NEXUS_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("NEXUS_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("NEXUS_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("NEXUS_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Ok(val) = std::env::var("NEXUS_SEARXNG_INSTANCE") {
            for engine in self.engines.iter_mut().filter(|e| e.engine == "searxng") {
                engine.base_url = Some(val.clone());
            }
        }
        if let Ok(val) = std::env::var("NEXUS_OLLAMA_HOST") {
            self.assist.host = val;
        }
        if let Ok(val) = std::env::var("NEXUS_OLLAMA_MODEL") {
            self.assist.model = val;
        }
        if let Ok(val) = std::env::var("NEXUS_ENABLE_ASSIST") {
            self.assist.enabled = val.parse().unwrap_or(self.assist.enabled);
        }
    }

    /// Check cross-field invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        let search = &self.search;
        if search.engine_timeout <= 0.0 || search.session_timeout <= 0.0 {
            return invalid("timeouts must be positive");
        }
        if search.engine_timeout >= search.session_timeout {
            return invalid("engine_timeout must be shorter than session_timeout");
        }
        if search.max_results_per_engine == 0
            || search.max_total_results == 0
            || search.default_max_results == 0
        {
            return invalid("result limits must be greater than zero");
        }
        if search.max_query_length == 0 {
            return invalid("max_query_length must be greater than zero");
        }
        if !(1..=MAX_SUB_QUERIES).contains(&search.max_sub_queries) {
            return invalid(format!("max_sub_queries must be within 1..={}", MAX_SUB_QUERIES));
        }
        search.scoring.validate()?;

        let mut seen = HashSet::new();
        for engine in &self.engines {
            if engine.name.is_empty() {
                return invalid("engine name must not be empty");
            }
            if !seen.insert(engine.name.as_str()) {
                return invalid(format!("duplicate engine name: {}", engine.name));
            }
            if engine.weight < 0.0 {
                return invalid(format!("engine {} has a negative weight", engine.name));
            }
            if matches!(engine.timeout, Some(t) if t <= 0.0) {
                return invalid(format!("engine {} has a non-positive timeout", engine.name));
            }
            if engine.max_concurrency == Some(0) {
                return invalid(format!("engine {} has zero max_concurrency", engine.name));
            }
        }
        if self.enabled_engines().is_empty() {
            return invalid("at least one engine must be enabled");
        }

        Ok(())
    }

    /// Get engine config by name
    pub fn get_engine(&self, name: &str) -> Option<&EngineConfig> {
        self.engines.iter().find(|e| e.name == name)
    }

    /// Get all enabled engines
    pub fn enabled_engines(&self) -> Vec<&EngineConfig> {
        self.engines.iter().filter(|e| !e.disabled).collect()
    }
}

fn invalid<T>(msg: impl Into<String>) -> Result<T, ConfigError> {
    Err(ConfigError::Invalid(msg.into()))
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported by the API root
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "Nexus Search".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
    /// Allowed CORS origins (empty = any)
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "127.0.0.1".to_string(),
            cors_origins: vec![],
        }
    }
}

/// Search pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Per-call timeout in seconds
    pub engine_timeout: f64,
    /// Whole-session deadline in seconds
    pub session_timeout: f64,
    /// Maximum results requested from each engine per call
    pub max_results_per_engine: usize,
    /// Hard cap on results returned to a caller
    pub max_total_results: usize,
    /// Result count when the caller does not ask for one
    pub default_max_results: usize,
    /// Maximum query length in characters
    pub max_query_length: usize,
    /// Maximum number of sub-queries per search
    pub max_sub_queries: usize,
    /// Ranking weights
    pub scoring: ScoringWeights,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            engine_timeout: DEFAULT_ENGINE_TIMEOUT as f64,
            session_timeout: DEFAULT_SESSION_TIMEOUT as f64,
            max_results_per_engine: 10,
            max_total_results: 50,
            default_max_results: 15,
            max_query_length: MAX_QUERY_LENGTH,
            max_sub_queries: 5,
            scoring: ScoringWeights::default(),
        }
    }
}

impl SearchSettings {
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.engine_timeout)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.session_timeout)
    }
}

/// Relative weights of the score components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Position within the engine's own ranking
    pub rank: f64,
    /// Engine authority from the weight table
    pub authority: f64,
    /// Agreement between engines
    pub consensus: f64,
    /// Query keyword overlap with title and snippet
    pub relevance: f64,
    /// Snippet completeness
    pub quality: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            rank: 0.30,
            authority: 0.15,
            consensus: 0.25,
            relevance: 0.20,
            quality: 0.10,
        }
    }
}

impl ScoringWeights {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.components().iter().any(|w| *w < 0.0) {
            return invalid("scoring weights must not be negative");
        }
        if self.total() <= 0.0 {
            return invalid("at least one scoring weight must be positive");
        }
        Ok(())
    }

    fn components(&self) -> [f64; 5] {
        [self.rank, self.authority, self.consensus, self.relevance, self.quality]
    }

    fn total(&self) -> f64 {
        self.components().iter().sum()
    }

    /// Weighted mean of the components, in `[0, 1]`
    pub fn combine(&self, scores: &ScoreBreakdown) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        let sum = self.rank * scores.rank
            + self.authority * scores.authority
            + self.consensus * scores.consensus
            + self.relevance * scores.relevance
            + self.quality * scores.quality;
        (sum / total).clamp(0.0, 1.0)
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// User agent sent to engines
    pub user_agent: String,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy for all outgoing requests
    pub proxy: Option<String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_ENGINE_TIMEOUT as f64,
            pool_maxsize: 20,
            user_agent: format!("nexus-search/{} (+https://github.com/nexus-search/nexus-search)", crate::VERSION),
            verify_ssl: true,
            proxy: None,
        }
    }
}

/// Language-model assist settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistSettings {
    /// Use the model for breakdown and summaries
    pub enabled: bool,
    /// Ollama server address
    pub host: String,
    /// Model name
    pub model: String,
    /// Seconds allowed for a query breakdown
    pub breakdown_timeout: f64,
    /// Seconds allowed for a summary
    pub summary_timeout: f64,
}

impl Default for AssistSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            breakdown_timeout: 5.0,
            summary_timeout: 10.0,
        }
    }
}

impl AssistSettings {
    pub fn breakdown_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.breakdown_timeout.max(0.0))
    }

    pub fn summary_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.summary_timeout.max(0.0))
    }
}

/// Individual engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine identifier (unique)
    pub name: String,
    /// Adapter type to use
    pub engine: String,
    /// Whether engine is disabled
    pub disabled: bool,
    /// Custom per-call timeout for this engine
    pub timeout: Option<f64>,
    /// Authority weight for scoring
    pub weight: f64,
    /// Maximum concurrent calls to this engine within one session
    pub max_concurrency: Option<usize>,
    /// Display name
    pub display_name: Option<String>,
    /// Endpoint override
    pub base_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            engine: String::new(),
            disabled: false,
            timeout: None,
            weight: 1.0,
            max_concurrency: None,
            display_name: None,
            base_url: None,
        }
    }
}

impl EngineConfig {
    /// Config for an adapter type, named after it
    pub fn new(engine: impl Into<String>, weight: f64) -> Self {
        let engine = engine.into();
        Self {
            name: engine.clone(),
            engine,
            weight,
            ..Default::default()
        }
    }
}

/// Default engine configurations, in priority order
fn default_engines() -> Vec<EngineConfig> {
    vec![
        EngineConfig {
            display_name: Some("Wikipedia".to_string()),
            ..EngineConfig::new("wikipedia", 1.0)
        },
        EngineConfig {
            display_name: Some("Wikidata".to_string()),
            ..EngineConfig::new("wikidata", 0.8)
        },
        EngineConfig {
            display_name: Some("SearXNG".to_string()),
            base_url: Some("https://searx.be".to_string()),
            ..EngineConfig::new("searxng", 0.6)
        },
        EngineConfig {
            display_name: Some("DuckDuckGo".to_string()),
            ..EngineConfig::new("duckduckgo", 0.4)
        },
        EngineConfig {
            display_name: Some("Qwant".to_string()),
            max_concurrency: Some(2),
            ..EngineConfig::new("qwant", 0.4)
        },
    ]
}
