//! nexus-search: multi-engine search orchestration
//!
//! A query is broken into focused sub-queries, fanned out in parallel to
//! several independent search engines, and the partial, possibly failing
//! responses are merged into one deduplicated, ranked result set that is
//! streamed back as progress events.

pub mod assist;
pub mod config;
pub mod engines;
pub mod gateway;
pub mod network;
pub mod query;
pub mod results;
pub mod search;
pub mod web;

pub use config::Settings;
pub use engines::{EngineRegistry, SearchAdapter};
pub use gateway::{SearchGateway, SearchResponse};
pub use results::{EngineError, EngineResult, ScoredResult};
pub use search::{SearchEvent, SearchSession};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default per-call engine timeout in seconds
pub const DEFAULT_ENGINE_TIMEOUT: u64 = 15;

/// Default whole-session timeout in seconds
pub const DEFAULT_SESSION_TIMEOUT: u64 = 30;

/// Default maximum query length in characters
pub const MAX_QUERY_LENGTH: usize = 500;

/// Upper bound on sub-queries per search
pub const MAX_SUB_QUERIES: usize = 6;
