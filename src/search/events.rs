//! Progress events streamed to a session's caller

use super::models::SessionStage;
use crate::results::ScoredResult;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::mpsc;

/// One typed progress event; `Complete` is always the last of a session
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchEvent {
    Status {
        stage: SessionStage,
        message: String,
    },
    Breakdown {
        sub_queries: Vec<String>,
    },
    EngineComplete {
        engine: String,
        count: usize,
    },
    Complete {
        results: Vec<ScoredResult>,
        summary: String,
        engine_stats: BTreeMap<String, usize>,
    },
    Error {
        message: String,
    },
}

impl SearchEvent {
    pub fn status(stage: SessionStage, message: impl Into<String>) -> Self {
        Self::Status {
            stage,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Event kind as it appears in the `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Breakdown { .. } => "breakdown",
            Self::EngineComplete { .. } => "engine_complete",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}

/// Producer side of a session's event channel
///
/// Sending never blocks the pipeline; events for a caller that has gone
/// away are dropped.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<SearchEvent>>,
}

impl EventSink {
    /// Sink plus the receiver the transport reads from
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SearchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Sink that drops every event
    pub fn discard() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: SearchEvent) {
        if let Some(ref tx) = self.tx {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let event = SearchEvent::status(SessionStage::Searching, "Searching 5 engines");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "status", "stage": "searching", "message": "Searching 5 engines"})
        );

        let event = SearchEvent::EngineComplete {
            engine: "wikipedia".to_string(),
            count: 4,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "engine_complete", "engine": "wikipedia", "count": 4})
        );

        let event = SearchEvent::Complete {
            results: vec![],
            summary: "Found 0 results".to_string(),
            engine_stats: BTreeMap::from([("qwant".to_string(), 0)]),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "complete", "results": [], "summary": "Found 0 results", "engine_stats": {"qwant": 0}})
        );
    }

    #[test]
    fn test_kind_matches_tag() {
        let event = SearchEvent::Breakdown {
            sub_queries: vec!["rust".to_string()],
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], event.kind());
        assert!(!event.is_terminal());
        assert!(SearchEvent::error("bad").is_terminal());
    }

    #[tokio::test]
    async fn test_sink_delivers_in_order() {
        let (sink, mut rx) = EventSink::channel();
        sink.emit(SearchEvent::error("one"));
        sink.emit(SearchEvent::error("two"));
        drop(sink);

        let mut messages = Vec::new();
        while let Some(SearchEvent::Error { message }) = rx.recv().await {
            messages.push(message);
        }
        assert_eq!(messages, vec!["one", "two"]);
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.emit(SearchEvent::error("nobody listening"));
        EventSink::discard().emit(SearchEvent::error("ignored"));
    }
}
