//! Search orchestration module
//!
//! Coordinates sub-query execution across all engines, tracks per-engine
//! state and reports progress as typed events.

mod events;
mod executor;
mod models;

pub use events::{EventSink, SearchEvent};
pub use executor::{OrchestrationReport, Orchestrator};
pub use models::*;
