//! Search engine module
//!
//! Defines the adapter contract, the HTTP engine bridge and the registry of
//! configured engines.

mod http;
mod loader;
mod registry;
mod table;
mod traits;

// Engine implementations
pub mod duckduckgo;
pub mod qwant;
pub mod searxng;
pub mod wikidata;
pub mod wikipedia;

pub use http::HttpEngine;
pub use loader::EngineLoader;
pub use registry::{EngineRegistry, RegisteredEngine};
pub use table::EngineTable;
pub use traits::*;
