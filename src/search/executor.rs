//! Parallel fan-out of sub-queries across engine adapters

use super::events::{EventSink, SearchEvent};
use super::models::{EngineRunStatus, RunState, SearchSession, SessionStage};
use crate::config::SearchSettings;
use crate::engines::{EngineRegistry, SearchAdapter};
use crate::query::SubQuery;
use crate::results::{EngineError, EngineResult};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

/// What happened during one orchestration pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationReport {
    /// Calls scheduled (sub-queries x engines)
    pub calls: usize,
    /// Calls that reached a result or error before the deadline
    pub finished_calls: usize,
    /// Whether the session deadline cut the search short
    pub deadline_hit: bool,
    pub elapsed: Duration,
}

/// Result of one (engine, sub-query) call
struct CallOutcome {
    engine: usize,
    result: Result<Vec<EngineResult>, EngineError>,
    elapsed: Duration,
}

/// Why calls were left without an outcome
#[derive(Debug, Clone, Copy)]
enum Unfinished {
    /// Cut off by the session deadline
    TimedOut,
    /// Task ended without reporting back
    Lost,
}

/// Running totals for one engine
#[derive(Default)]
struct Tally {
    remaining: usize,
    ok: usize,
    timed_out: usize,
    failed: usize,
    results: usize,
    last_error: Option<String>,
}

impl Tally {
    fn state(&self) -> RunState {
        if self.ok > 0 {
            RunState::Complete
        } else if self.timed_out > 0 {
            RunState::TimedOut
        } else {
            RunState::Failed
        }
    }
}

/// Fans sub-queries out to every registered engine
///
/// Each (engine, sub-query) pair runs as its own task, bounded by the
/// per-call timeout. The whole pass is bounded by the session timeout,
/// after which outstanding calls are cancelled.
#[derive(Clone)]
pub struct Orchestrator {
    registry: Arc<EngineRegistry>,
    engine_timeout: Duration,
    session_timeout: Duration,
    max_results_per_engine: usize,
}

impl Orchestrator {
    pub fn new(registry: Arc<EngineRegistry>, settings: &SearchSettings) -> Self {
        Self {
            registry,
            engine_timeout: settings.engine_timeout(),
            session_timeout: settings.session_timeout(),
            max_results_per_engine: settings.max_results_per_engine,
        }
    }

    /// Override both timeouts
    pub fn with_timeouts(mut self, engine_timeout: Duration, session_timeout: Duration) -> Self {
        self.engine_timeout = engine_timeout;
        self.session_timeout = session_timeout;
        self
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    pub fn session_timeout(&self) -> Duration {
        self.session_timeout
    }

    /// Search every sub-query on every engine, filling `session.statuses`
    /// and `session.results`
    pub async fn run(&self, session: &mut SearchSession, events: &EventSink) -> OrchestrationReport {
        let started = Instant::now();
        let deadline = started + self.session_timeout;

        if session.sub_queries.is_empty() {
            session.sub_queries.push(SubQuery::from(&session.query));
        }

        let engines: Vec<_> = self.registry.iter().collect();
        let calls_per_engine = session.sub_queries.len();
        session.statuses = engines
            .iter()
            .map(|e| {
                let mut status = EngineRunStatus::pending(e.name());
                status.start(calls_per_engine);
                status
            })
            .collect();
        let mut tallies: Vec<Tally> = engines
            .iter()
            .map(|_| Tally {
                remaining: calls_per_engine,
                ..Default::default()
            })
            .collect();

        let mut tasks = JoinSet::new();
        for (idx, engine) in engines.iter().enumerate() {
            let call_timeout = self
                .registry
                .timeout(engine.name(), self.engine_timeout)
                .min(self.session_timeout);
            let limit = self
                .registry
                .max_concurrency(engine.name())
                .map(|n| Arc::new(Semaphore::new(n.max(1))));

            for sub_query in &session.sub_queries {
                tasks.spawn(call_engine(
                    idx,
                    engine.adapter.clone(),
                    sub_query.as_str().to_string(),
                    self.max_results_per_engine,
                    call_timeout,
                    limit.clone(),
                ));
            }
        }

        let calls = engines.len() * calls_per_engine;
        info!(
            "Session {}: dispatching {} calls ({} sub-queries x {} engines)",
            session.id,
            calls,
            calls_per_engine,
            engines.len()
        );

        let mut finished_calls = 0;
        let mut lost_calls = 0;
        let mut deadline_hit = false;
        loop {
            match timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok(outcome))) => {
                    finished_calls += 1;
                    let idx = outcome.engine;
                    let name = engines[idx].name().to_string();
                    let accepted = self.accept(&name, outcome, &mut tallies[idx], session);
                    events.emit(SearchEvent::EngineComplete {
                        engine: name.clone(),
                        count: accepted,
                    });

                    if tallies[idx].remaining == 0 {
                        let elapsed = started.elapsed();
                        Self::finish_engine(session, &name, &tallies[idx], elapsed, events);
                    }
                }
                Ok(Some(Err(e))) => {
                    finished_calls += 1;
                    lost_calls += 1;
                    warn!("Engine task ended unexpectedly: {}", e);
                }
                Ok(None) => break,
                Err(_) => {
                    deadline_hit = true;
                    tasks.abort_all();
                    break;
                }
            }
        }

        if deadline_hit {
            let elapsed = started.elapsed();
            let outstanding = calls - finished_calls;
            warn!(
                "Session {}: deadline of {:?} reached with {} calls outstanding",
                session.id, self.session_timeout, outstanding
            );
            let names: Vec<&str> = engines.iter().map(|e| e.name()).collect();
            Self::settle_unfinished(session, &names, &mut tallies, Unfinished::TimedOut, elapsed, events);
            events.emit(SearchEvent::status(
                SessionStage::Searching,
                format!(
                    "Search deadline of {}s reached; continuing with partial results ({} of {} calls finished)",
                    self.session_timeout.as_secs_f64(),
                    finished_calls,
                    calls
                ),
            ));
        }

        if lost_calls > 0 {
            let names: Vec<&str> = engines.iter().map(|e| e.name()).collect();
            Self::settle_unfinished(
                session,
                &names,
                &mut tallies,
                Unfinished::Lost,
                started.elapsed(),
                events,
            );
        }

        let elapsed = started.elapsed();
        info!(
            "Session {}: {} results from {}/{} calls in {:?}",
            session.id,
            session.results.len(),
            finished_calls,
            calls,
            elapsed
        );

        OrchestrationReport {
            calls,
            finished_calls,
            deadline_hit,
            elapsed,
        }
    }

    /// Record one call's outcome, returning how many results it contributed
    fn accept(
        &self,
        engine: &str,
        outcome: CallOutcome,
        tally: &mut Tally,
        session: &mut SearchSession,
    ) -> usize {
        tally.remaining = tally.remaining.saturating_sub(1);
        match outcome.result {
            Ok(results) => {
                let before = session.results.len();
                session.results.extend(
                    results
                        .into_iter()
                        .filter(|r| r.has_valid_url())
                        .take(self.max_results_per_engine)
                        .map(|mut r| {
                            r.source = engine.to_string();
                            r
                        }),
                );
                let accepted = session.results.len() - before;
                tally.ok += 1;
                tally.results += accepted;
                debug!("{} returned {} results in {:?}", engine, accepted, outcome.elapsed);
                accepted
            }
            Err(e) => {
                if e.is_timeout() {
                    tally.timed_out += 1;
                } else {
                    tally.failed += 1;
                }
                warn!("{} call failed after {:?}: {}", engine, outcome.elapsed, e);
                tally.last_error = Some(e.to_string());
                0
            }
        }
    }

    /// Close out every engine that still has calls without an outcome
    fn settle_unfinished(
        session: &mut SearchSession,
        engines: &[&str],
        tallies: &mut [Tally],
        reason: Unfinished,
        elapsed: Duration,
        events: &EventSink,
    ) {
        for (engine, tally) in engines.iter().zip(tallies.iter_mut()) {
            if tally.remaining == 0 {
                continue;
            }
            match reason {
                Unfinished::TimedOut => tally.timed_out += tally.remaining,
                Unfinished::Lost => {
                    tally.failed += tally.remaining;
                    tally.last_error = Some("engine task ended unexpectedly".to_string());
                }
            }
            tally.remaining = 0;
            Self::finish_engine(session, engine, tally, elapsed, events);
        }
    }

    fn finish_engine(
        session: &mut SearchSession,
        engine: &str,
        tally: &Tally,
        elapsed: Duration,
        events: &EventSink,
    ) {
        let state = tally.state();
        let Some(status) = session.status_mut(engine) else {
            return;
        };
        if !status.finish(state, elapsed) {
            return;
        }
        status.result_count = tally.results;
        status.failed_calls = tally.timed_out + tally.failed;
        status.error = tally.last_error.clone();

        let message = match state {
            RunState::Complete => format!("{} finished with {} results", engine, tally.results),
            RunState::TimedOut => format!("{} timed out", engine),
            _ => format!(
                "{} failed: {}",
                engine,
                tally.last_error.as_deref().unwrap_or("unknown error")
            ),
        };
        events.emit(SearchEvent::status(SessionStage::Searching, message));
    }
}

/// One bounded adapter call
async fn call_engine(
    engine: usize,
    adapter: Arc<dyn SearchAdapter>,
    sub_query: String,
    max_results: usize,
    call_timeout: Duration,
    limit: Option<Arc<Semaphore>>,
) -> CallOutcome {
    let _permit = match limit {
        Some(semaphore) => semaphore.acquire_owned().await.ok(),
        None => None,
    };

    let started = Instant::now();
    debug!("Dispatching '{}' to {}", sub_query, adapter.name());
    let call =
        AssertUnwindSafe(async { adapter.search(&sub_query, max_results, call_timeout).await })
            .catch_unwind();
    let result = match timeout(call_timeout, call).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(EngineError::Unreachable("adapter panicked".to_string())),
        Err(_) => Err(EngineError::Timeout),
    };

    CallOutcome {
        engine,
        result,
        elapsed: started.elapsed(),
    }
}
