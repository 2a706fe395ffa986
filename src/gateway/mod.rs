//! Session gateway: drives one query through breakdown, search and
//! synthesis, reporting each stage as an event

use crate::assist::LanguageModel;
use crate::config::Settings;
use crate::engines::EngineRegistry;
use crate::query::{Query, QueryProcessor, ValidationError};
use crate::results::{ScoredResult, Summarizer, Synthesizer};
use crate::search::{
    EngineRunStatus, EventSink, Orchestrator, SearchEvent, SearchSession, SessionError,
    SessionStage,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Errors a caller can see
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Request bounds applied before a session starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_query_length: usize,
    pub default_max_results: usize,
    pub max_total_results: usize,
}

impl Limits {
    /// Requested result count, defaulted and clamped
    pub fn result_count(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_max_results)
            .clamp(1, self.max_total_results.max(1))
    }
}

impl Default for Limits {
    fn default() -> Self {
        let search = crate::config::SearchSettings::default();
        Self {
            max_query_length: search.max_query_length,
            default_max_results: search.default_max_results,
            max_total_results: search.max_total_results,
        }
    }
}

/// Final payload of a completed session
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub sub_queries: Vec<String>,
    pub results: Vec<ScoredResult>,
    pub summary: String,
    pub engine_stats: BTreeMap<String, usize>,
    pub engine_status: Vec<EngineRunStatus>,
    /// Hits gathered before deduplication
    pub total_raw: usize,
    /// Distinct results before truncation to the requested count
    pub total_unique: usize,
    /// Session deadline cut the search short
    pub degraded: bool,
    /// Seconds
    pub processing_time: f64,
}

/// Entry point for one search, shared by every transport
#[derive(Clone)]
pub struct SearchGateway {
    processor: QueryProcessor,
    orchestrator: Orchestrator,
    synthesizer: Synthesizer,
    summarizer: Summarizer,
    limits: Limits,
}

impl SearchGateway {
    pub fn new(
        processor: QueryProcessor,
        orchestrator: Orchestrator,
        synthesizer: Synthesizer,
        summarizer: Summarizer,
        limits: Limits,
    ) -> Self {
        Self {
            processor,
            orchestrator,
            synthesizer,
            summarizer,
            limits,
        }
    }

    /// Wire the pipeline from settings; `assist` enables model breakdown
    /// and summaries
    pub fn from_settings(
        settings: &Settings,
        registry: Arc<EngineRegistry>,
        assist: Option<Arc<dyn LanguageModel>>,
    ) -> Self {
        let search = &settings.search;
        let mut processor = QueryProcessor::new(search.max_sub_queries);
        let mut summarizer = Summarizer::templated();
        if let Some(model) = assist {
            processor = processor.with_assist(model.clone(), settings.assist.breakdown_timeout());
            summarizer = Summarizer::with_model(model, settings.assist.summary_timeout());
        }

        let synthesizer = Synthesizer::new(Arc::new(registry.table()), search.scoring);
        let orchestrator = Orchestrator::new(registry, search);

        Self::new(
            processor,
            orchestrator,
            synthesizer,
            summarizer,
            Limits {
                max_query_length: search.max_query_length,
                default_max_results: search.default_max_results,
                max_total_results: search.max_total_results,
            },
        )
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Run a search without progress reporting
    pub async fn search(
        &self,
        raw_query: &str,
        max_results: Option<usize>,
    ) -> Result<SearchResponse, GatewayError> {
        self.run(raw_query, max_results, &EventSink::discard()).await
    }

    /// Run a search, emitting progress to `events`. The last event is
    /// always `complete` or `error`.
    pub async fn run(
        &self,
        raw_query: &str,
        max_results: Option<usize>,
        events: &EventSink,
    ) -> Result<SearchResponse, GatewayError> {
        let query = match Query::parse(raw_query, self.limits.max_query_length) {
            Ok(query) => query,
            Err(e) => {
                warn!("Rejected query: {}", e);
                events.emit(SearchEvent::error(e.to_string()));
                return Err(e.into());
            }
        };

        let mut session = SearchSession::new(query);
        match self.drive(&mut session, max_results, events).await {
            Ok(response) => Ok(response),
            Err(e) => {
                let _ = session.transition(SessionStage::Error);
                events.emit(SearchEvent::error(e.to_string()));
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        session: &mut SearchSession,
        max_results: Option<usize>,
        events: &EventSink,
    ) -> Result<SearchResponse, GatewayError> {
        let max_results = self.limits.result_count(max_results);
        info!("Session {}: searching for '{}'", session.id, session.query);

        advance(session, SessionStage::BreakingDown, "Analyzing query", events)?;
        session.sub_queries = self.processor.breakdown(&session.query).await;
        let sub_queries: Vec<String> = session
            .sub_queries
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        events.emit(SearchEvent::Breakdown {
            sub_queries: sub_queries.clone(),
        });

        let engine_count = self.orchestrator.registry().len();
        advance(
            session,
            SessionStage::Searching,
            format!(
                "Searching {} engines with {} sub-queries",
                engine_count,
                sub_queries.len()
            ),
            events,
        )?;
        let report = self.orchestrator.run(session, events).await;

        advance(session, SessionStage::Synthesizing, "Synthesizing results", events)?;
        let results = std::mem::take(&mut session.results);
        let synthesis = self
            .synthesizer
            .synthesize(session.query.as_str(), results, max_results);
        let summary = self.summarizer.summarize(&session.query, &synthesis).await;

        let message = if report.deadline_hit {
            format!("Search complete with partial results ({} found)", synthesis.results.len())
        } else {
            format!("Search complete ({} results)", synthesis.results.len())
        };
        advance(session, SessionStage::Complete, message, events)?;

        let response = SearchResponse {
            query: session.query.to_string(),
            sub_queries,
            results: synthesis.results,
            summary,
            engine_stats: synthesis.engine_stats,
            engine_status: std::mem::take(&mut session.statuses),
            total_raw: synthesis.total_raw,
            total_unique: synthesis.total_unique,
            degraded: report.deadline_hit,
            processing_time: session.elapsed().as_secs_f64(),
        };
        info!(
            "Session {}: {} results in {:.2}s",
            session.id,
            response.results.len(),
            response.processing_time
        );

        events.emit(SearchEvent::Complete {
            results: response.results.clone(),
            summary: response.summary.clone(),
            engine_stats: response.engine_stats.clone(),
        });
        Ok(response)
    }
}

/// Transition and announce it
fn advance(
    session: &mut SearchSession,
    stage: SessionStage,
    message: impl Into<String>,
    events: &EventSink,
) -> Result<(), SessionError> {
    session.transition(stage)?;
    events.emit(SearchEvent::status(stage, message));
    Ok(())
}
