//! Session and per-engine state models

use crate::query::{Query, SubQuery};
use crate::results::EngineResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Lifecycle of one engine within one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running,
    Complete,
    Failed,
    TimedOut,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::TimedOut)
    }
}

/// Per-engine, per-session progress record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRunStatus {
    pub engine: String,
    pub status: RunState,
    /// Results contributed across all sub-queries
    pub result_count: usize,
    /// Time from dispatch to the engine's last call finishing
    pub elapsed_ms: u64,
    /// Calls scheduled for this engine
    pub calls: usize,
    /// Calls that failed or timed out
    pub failed_calls: usize,
    /// Last error seen, if any
    pub error: Option<String>,
}

impl EngineRunStatus {
    pub fn pending(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            status: RunState::Pending,
            result_count: 0,
            elapsed_ms: 0,
            calls: 0,
            failed_calls: 0,
            error: None,
        }
    }

    /// Move from pending to running; ignored in any other state
    pub fn start(&mut self, calls: usize) {
        if self.status == RunState::Pending {
            self.status = RunState::Running;
            self.calls = calls;
        }
    }

    /// Set the terminal state. Returns false, changing nothing, when the
    /// status is already terminal.
    pub fn finish(&mut self, state: RunState, elapsed: Duration) -> bool {
        if self.status.is_terminal() || !state.is_terminal() {
            return false;
        }
        self.status = state;
        self.elapsed_ms = elapsed.as_millis() as u64;
        true
    }
}

/// Gateway stage of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    Idle,
    BreakingDown,
    Searching,
    Synthesizing,
    Complete,
    Error,
}

impl SessionStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }

    /// Whether `self -> next` is a legal step
    pub fn can_transition(self, next: SessionStage) -> bool {
        use SessionStage::*;
        match (self, next) {
            (Idle, BreakingDown)
            | (BreakingDown, Searching)
            | (Searching, Synthesizing)
            | (Synthesizing, Complete) => true,
            (from, Error) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::BreakingDown => "breaking_down",
            Self::Searching => "searching",
            Self::Synthesizing => "synthesizing",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: SessionStage,
        to: SessionStage,
    },
}

/// One in-flight search, owned by a single gateway run
#[derive(Debug, Clone)]
pub struct SearchSession {
    pub id: Uuid,
    pub query: Query,
    pub sub_queries: Vec<SubQuery>,
    pub statuses: Vec<EngineRunStatus>,
    pub results: Vec<EngineResult>,
    pub created_at: DateTime<Utc>,
    stage: SessionStage,
    started: Instant,
}

impl SearchSession {
    pub fn new(query: Query) -> Self {
        Self {
            id: Uuid::new_v4(),
            query,
            sub_queries: Vec::new(),
            statuses: Vec::new(),
            results: Vec::new(),
            created_at: Utc::now(),
            stage: SessionStage::Idle,
            started: Instant::now(),
        }
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    /// Advance the state machine
    pub fn transition(&mut self, next: SessionStage) -> Result<(), SessionError> {
        if !self.stage.can_transition(next) {
            return Err(SessionError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        Ok(())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn status(&self, engine: &str) -> Option<&EngineRunStatus> {
        self.statuses.iter().find(|s| s.engine == engine)
    }

    pub fn status_mut(&mut self, engine: &str) -> Option<&mut EngineRunStatus> {
        self.statuses.iter_mut().find(|s| s.engine == engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SearchSession {
        SearchSession::new(Query::parse("rust", 500).unwrap())
    }

    #[test]
    fn test_happy_path() {
        let mut session = session();
        for stage in [
            SessionStage::BreakingDown,
            SessionStage::Searching,
            SessionStage::Synthesizing,
            SessionStage::Complete,
        ] {
            assert!(session.transition(stage).is_ok());
        }
        assert!(session.stage().is_terminal());
    }

    #[test]
    fn test_no_skipping_stages() {
        let mut session = session();
        let err = session.transition(SessionStage::Searching).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                from: SessionStage::Idle,
                to: SessionStage::Searching
            }
        );
        assert_eq!(session.stage(), SessionStage::Idle);
    }

    #[test]
    fn test_error_from_any_live_stage() {
        assert!(SessionStage::Idle.can_transition(SessionStage::Error));
        assert!(SessionStage::Searching.can_transition(SessionStage::Error));
        assert!(!SessionStage::Complete.can_transition(SessionStage::Error));
        assert!(!SessionStage::Error.can_transition(SessionStage::Error));
    }

    #[test]
    fn test_status_finishes_once() {
        let mut status = EngineRunStatus::pending("wikipedia");
        status.start(2);
        assert_eq!(status.status, RunState::Running);
        assert!(status.finish(RunState::TimedOut, Duration::from_millis(1500)));
        assert!(!status.finish(RunState::Complete, Duration::from_millis(2000)));
        assert_eq!(status.status, RunState::TimedOut);
        assert_eq!(status.elapsed_ms, 1500);
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&SessionStage::BreakingDown).unwrap();
        assert_eq!(json, "\"breaking_down\"");
        assert_eq!(
            serde_json::to_string(&RunState::TimedOut).unwrap(),
            "\"timed_out\""
        );
    }
}
