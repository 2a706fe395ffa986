//! Result types, deduplication, ranking and summaries
//!
//! Engines produce `EngineResult`s; the `Synthesizer` merges them into
//! ranked `ScoredResult`s and the `Summarizer` describes the outcome.

mod summary;
mod synthesizer;
mod types;
mod url;

pub use self::url::normalize_url;
pub use summary::Summarizer;
pub use synthesizer::{templated_summary, Synthesis, Synthesizer, TITLE_SIMILARITY_THRESHOLD};
pub use types::*;
