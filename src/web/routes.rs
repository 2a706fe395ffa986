//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

fn cors(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok())
                .collect::<Vec<_>>(),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = cors(&state.settings.server.cors_origins);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/search", post(handlers::search))
        .route("/ws", get(handlers::ws))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, Settings};
    use crate::engines::{EngineRegistry, SearchAdapter};
    use crate::gateway::SearchGateway;
    use crate::results::{EngineError, EngineResult};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use futures::{SinkExt, StreamExt};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
    use tower::ServiceExt;

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    struct Static;

    #[async_trait]
    impl SearchAdapter for Static {
        fn name(&self) -> &str {
            "wikipedia"
        }

        async fn search(
            &self,
            sub_query: &str,
            _max_results: usize,
            _timeout: Duration,
        ) -> Result<Vec<EngineResult>, EngineError> {
            Ok(vec![EngineResult::new(
                "https://en.wikipedia.org/wiki/Rust",
                format!("{} article", sub_query),
                "wikipedia",
            )])
        }
    }

    fn app() -> Router {
        let settings = Settings::default();
        let mut registry = EngineRegistry::new();
        registry.register(Arc::new(Static), EngineConfig::new("wikipedia", 1.0));
        let registry = Arc::new(registry);
        let gateway = SearchGateway::from_settings(&settings, registry.clone(), None);
        create_router(AppState::with_gateway(settings, registry, gateway))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_search(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/search")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], crate::VERSION);
    }

    #[tokio::test]
    async fn test_index_lists_engines() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["engines"], serde_json::json!(["wikipedia"]));
    }

    #[tokio::test]
    async fn test_search() {
        let response = app()
            .oneshot(post_search(r#"{"query": "rust", "max_results": 3}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["query"], "rust");
        assert_eq!(body["results"][0]["url"], "https://en.wikipedia.org/wiki/Rust");
        assert_eq!(body["engine_stats"]["wikipedia"], 1);
        assert_eq!(body["total_raw"], 1);
        assert!(body["summary"].as_str().unwrap().starts_with("Found 1 result"));
    }

    #[tokio::test]
    async fn test_empty_query_is_bad_request() {
        let response = app().oneshot(post_search(r#"{"query": "  "}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "query must not be empty");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let response = app().oneshot(post_search("{\"q\": 1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_search_requires_post() {
        let response = app()
            .oneshot(Request::builder().uri("/search").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    /// Serve the app on an ephemeral port and open a socket to `/ws`
    async fn connect() -> Client {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app()).await.unwrap() });

        let (client, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
        client
    }

    async fn send(client: &mut Client, text: &str) {
        client.send(WsMessage::Text(text.to_string())).await.unwrap();
    }

    async fn next_event(client: &mut Client) -> serde_json::Value {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(10), client.next())
                .await
                .expect("no frame within 10s")
                .expect("socket closed")
                .unwrap();
            if let WsMessage::Text(text) = frame {
                return serde_json::from_str(&text).unwrap();
            }
        }
    }

    /// Events of one session, up to and including `complete` or `error`
    async fn session_events(client: &mut Client) -> Vec<serde_json::Value> {
        let mut events = Vec::new();
        loop {
            let event = next_event(client).await;
            let last = matches!(event["type"].as_str(), Some("complete" | "error"));
            events.push(event);
            if last {
                return events;
            }
        }
    }

    #[tokio::test]
    async fn test_ws_streams_a_session() {
        let mut client = connect().await;
        send(&mut client, r#"{"query": "rust", "max_results": 5}"#).await;

        let events = session_events(&mut client).await;
        let kinds: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();

        assert_eq!(kinds[0], "status");
        assert_eq!(events[0]["stage"], "breaking_down");
        assert_eq!(kinds[1], "breakdown");
        assert_eq!(events[1]["sub_queries"], serde_json::json!(["rust"]));
        assert!(kinds.contains(&"engine_complete"));
        assert_eq!(*kinds.last().unwrap(), "complete");

        let complete = events.last().unwrap();
        assert_eq!(complete["results"][0]["url"], "https://en.wikipedia.org/wiki/Rust");
        assert_eq!(complete["engine_stats"]["wikipedia"], 1);
    }

    #[tokio::test]
    async fn test_ws_bad_frame_keeps_connection_open() {
        let mut client = connect().await;

        send(&mut client, "not json").await;
        let error = next_event(&mut client).await;
        assert_eq!(error["type"], "error");
        assert!(error["message"].as_str().unwrap().starts_with("invalid request"));

        send(&mut client, r#"{"query": "   "}"#).await;
        let error = next_event(&mut client).await;
        assert_eq!(error["type"], "error");
        assert_eq!(error["message"], "query must not be empty");

        send(&mut client, r#"{"query": "rust"}"#).await;
        let events = session_events(&mut client).await;
        assert_eq!(events.last().unwrap()["type"], "complete");
    }

    #[tokio::test]
    async fn test_ws_frames_run_in_order() {
        let mut client = connect().await;
        send(&mut client, r#"{"query": "alpha"}"#).await;
        send(&mut client, r#"{"query": "beta"}"#).await;

        let first = session_events(&mut client).await;
        let second = session_events(&mut client).await;

        assert_eq!(first[1]["sub_queries"][0], "alpha");
        assert_eq!(first.last().unwrap()["results"][0]["title"], "alpha article");
        assert!(first
            .iter()
            .all(|e| e["sub_queries"].get(0).map_or(true, |q| q == "alpha")));

        assert_eq!(second[1]["sub_queries"][0], "beta");
        assert_eq!(second.last().unwrap()["results"][0]["title"], "beta article");
    }
}
