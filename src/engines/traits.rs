//! Engine traits and types

use crate::config::EngineConfig;
use crate::results::{EngineError, EngineResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Anything the orchestrator can send a sub-query to
///
/// Implementations must be safe to call concurrently from many tasks and
/// must give up after `timeout`.
#[async_trait]
pub trait SearchAdapter: Send + Sync {
    /// Engine name, used as the result source and stats key
    fn name(&self) -> &str;

    /// Run one sub-query, returning at most `max_results` ranked results
    async fn search(
        &self,
        sub_query: &str,
        max_results: usize,
        timeout: Duration,
    ) -> Result<Vec<EngineResult>, EngineError>;
}

/// Parameters for building a search request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestParams {
    /// Sub-query text
    pub query: String,
    /// Number of results wanted
    pub max_results: usize,
    /// Language code
    pub lang: String,
}

impl RequestParams {
    /// Create new request parameters
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results,
            lang: "en".to_string(),
        }
    }
}

/// HTTP request to be made by the engine
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// URL to request
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub params: Vec<(String, String)>,
    /// JSON request body
    pub body: Option<serde_json::Value>,
}

impl EngineRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::with_method(url, HttpMethod::Get)
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self::with_method(url, HttpMethod::Post)
    }

    fn with_method(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HashMap::new(),
            params: Vec::new(),
            body: None,
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Add JSON body
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of a query parameter, if set
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// HTTP response from engine request
#[derive(Debug)]
pub struct EngineResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl EngineResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, EngineError> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response indicates rate limiting
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// A JSON-API engine: builds one request and parses its response
///
/// `HttpEngine` turns any `Engine` into a `SearchAdapter`.
pub trait Engine: Send + Sync {
    /// Adapter type name
    fn name(&self) -> &str;

    /// Build the HTTP request for a sub-query
    fn request(&self, params: &RequestParams) -> Result<EngineRequest, EngineError>;

    /// Parse the HTTP response into ranked results
    fn response(
        &self,
        response: EngineResponse,
        params: &RequestParams,
    ) -> Result<Vec<EngineResult>, EngineError>;

    /// Apply per-engine configuration (called once on load)
    fn init(&mut self, _config: &EngineConfig) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Shorten text to at most `max` characters on a char boundary
pub(crate) fn truncate_text(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", text[..idx].trim_end()),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = EngineRequest::get("https://example.com/api")
            .param("q", "rust")
            .param("limit", 5)
            .header("Accept", "application/json");

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.param_value("q"), Some("rust"));
        assert_eq!(request.param_value("limit"), Some("5"));
        assert_eq!(request.param_value("missing"), None);
    }

    #[test]
    fn test_response_status() {
        let response = EngineResponse {
            status: 429,
            headers: HashMap::new(),
            text: String::new(),
            url: "https://example.com".to_string(),
        };
        assert!(!response.is_success());
        assert!(response.is_rate_limited());
    }

    #[test]
    fn test_response_json_error() {
        let response = EngineResponse {
            status: 200,
            headers: HashMap::new(),
            text: "<html>".to_string(),
            url: "https://example.com".to_string(),
        };
        let parsed: Result<serde_json::Value, _> = response.json();
        assert!(matches!(parsed, Err(EngineError::ParseFailure(_))));
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("héllo wörld", 5), "héllo...");
    }
}
