//! HTTP and WebSocket request handlers

use super::state::AppState;
use crate::gateway::GatewayError;
use crate::search::{EventSink, SearchEvent};
use axum::{
    extract::{
        rejection::JsonRejection,
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{debug, error, warn};

/// Body of `POST /search` and of each WebSocket text frame
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub max_results: Option<usize>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// Service description
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": state.instance_name(),
        "version": crate::VERSION,
        "engines": state.registry.names(),
        "endpoints": {
            "search": "POST /search",
            "stream": "GET /ws",
            "health": "GET /health",
        },
    }))
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": crate::VERSION,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Single request/response search
pub async fn search(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    match state.gateway.search(&request.query, request.max_results).await {
        Ok(response) => Json(response).into_response(),
        Err(GatewayError::Validation(e)) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            error!("Search failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Upgrade to a streaming search connection
pub async fn ws(State(state): State<AppState>, upgrade: WebSocketUpgrade) -> Response {
    upgrade.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Parse one inbound frame
pub(crate) fn parse_frame(text: &str) -> Result<SearchRequest, String> {
    serde_json::from_str(text).map_err(|e| format!("invalid request: {}", e))
}

async fn send_event(socket: &mut WebSocket, event: &SearchEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            error!("Failed to encode {} event: {}", event.kind(), e);
            true
        }
    }
}

/// One session per text frame, run in order; events are forwarded as
/// JSON text frames until the session ends
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    debug!("WebSocket connected");

    while let Some(frame) = socket.recv().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(Message::Binary(_)) => {
                let event = SearchEvent::error("binary frames are not supported");
                if !send_event(&mut socket, &event).await {
                    break;
                }
                continue;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        };

        let request = match parse_frame(&text) {
            Ok(request) => request,
            Err(message) => {
                if !send_event(&mut socket, &SearchEvent::error(message)).await {
                    break;
                }
                continue;
            }
        };

        let (sink, mut rx) = EventSink::channel();
        let gateway = state.gateway.clone();
        let session = tokio::spawn(async move {
            let _ = gateway
                .run(&request.query, request.max_results, &sink)
                .await;
        });

        let mut connected = true;
        while let Some(event) = rx.recv().await {
            if !send_event(&mut socket, &event).await {
                connected = false;
                break;
            }
        }

        if !connected {
            debug!("WebSocket closed mid-session, cancelling search");
            session.abort();
            break;
        }
    }

    debug!("WebSocket disconnected");
}
