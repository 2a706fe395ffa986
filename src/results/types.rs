//! Result type definitions

use serde::{Deserialize, Serialize};
use url::Url;

/// A single hit returned by one engine adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResult {
    /// The title of the result
    pub title: String,
    /// Content snippet/description
    pub snippet: String,
    /// The URL of the result
    pub url: String,
    /// Engine identifier that returned this result
    pub source: String,
    /// 1-based position in the engine's own ranking
    pub raw_rank: u32,
}

impl EngineResult {
    /// Create a new result at rank 1 with an empty snippet
    pub fn new(url: impl Into<String>, title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            snippet: String::new(),
            url: url.into(),
            source: source.into(),
            raw_rank: 1,
        }
    }

    /// Add a snippet to the result
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Set the engine-local position
    pub fn with_rank(mut self, rank: u32) -> Self {
        self.raw_rank = rank.max(1);
        self
    }

    /// Parsed URL, if the result carries a syntactically valid one
    pub fn parsed_url(&self) -> Option<Url> {
        Url::parse(self.url.trim()).ok()
    }

    /// Whether the URL parses as an absolute URI
    pub fn has_valid_url(&self) -> bool {
        self.parsed_url().is_some()
    }
}

/// Per-component breakdown of a final score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub rank: f64,
    pub authority: f64,
    pub consensus: f64,
    pub relevance: f64,
    pub quality: f64,
}

/// A deduplicated, scored result. Only the synthesizer builds these.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredResult {
    title: String,
    snippet: String,
    url: String,
    source: String,
    raw_rank: u32,
    sources: Vec<String>,
    duplicates: Vec<String>,
    scores: ScoreBreakdown,
    final_score: f64,
}

impl ScoredResult {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        title: String,
        snippet: String,
        url: String,
        source: String,
        raw_rank: u32,
        sources: Vec<String>,
        duplicates: Vec<String>,
        scores: ScoreBreakdown,
        final_score: f64,
    ) -> Self {
        Self {
            title,
            snippet,
            url,
            source,
            raw_rank,
            sources,
            duplicates,
            scores,
            final_score: final_score.clamp(0.0, 1.0),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Engine the surviving entry came from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Best position any contributing engine gave this result
    pub fn raw_rank(&self) -> u32 {
        self.raw_rank
    }

    /// Every engine that returned this result, in engine priority order
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// URLs of results that were folded into this one
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    pub fn scores(&self) -> ScoreBreakdown {
        self.scores
    }

    /// Combined score in `[0, 1]`
    pub fn final_score(&self) -> f64 {
        self.final_score
    }

    /// Project back to the raw shape, keeping the primary source and best rank
    pub fn to_engine_result(&self) -> EngineResult {
        EngineResult {
            title: self.title.clone(),
            snippet: self.snippet.clone(),
            url: self.url.clone(),
            source: self.source.clone(),
            raw_rank: self.raw_rank,
        }
    }
}

/// Engine error types, scoped to one (engine, sub-query) call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("request timed out")]
    Timeout,
    #[error("engine unreachable: {0}")]
    Unreachable(String),
    #[error("failed to parse response: {0}")]
    ParseFailure(String),
    #[error("rate limited by engine")]
    RateLimited,
}

impl EngineError {
    /// Whether this error counts as a timeout rather than a failure
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseFailure(err.to_string())
    }
}
