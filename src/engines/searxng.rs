//! SearXNG metasearch instance

use super::traits::*;
use crate::config::EngineConfig;
use crate::results::{EngineError, EngineResult};
use serde::Deserialize;

/// Default public instance
pub const DEFAULT_INSTANCE: &str = "https://searx.be";

/// Queries a SearXNG instance through its JSON output format
pub struct SearXNG {
    instance: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: Option<String>,
}

impl SearXNG {
    pub fn new() -> Self {
        Self::with_instance(DEFAULT_INSTANCE)
    }

    pub fn with_instance(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for SearXNG {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for SearXNG {
    fn name(&self) -> &str {
        "searxng"
    }

    fn init(&mut self, config: &EngineConfig) -> anyhow::Result<()> {
        if let Some(ref url) = config.base_url {
            let parsed = url::Url::parse(url)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!("searxng instance must be http(s): {}", url);
            }
            self.instance = url.trim_end_matches('/').to_string();
        }
        Ok(())
    }

    fn request(&self, params: &RequestParams) -> Result<EngineRequest, EngineError> {
        Ok(EngineRequest::get(format!("{}/search", self.instance))
            .param("q", &params.query)
            .param("format", "json")
            .param("pageno", 1)
            .param("language", &params.lang))
    }

    fn response(
        &self,
        response: EngineResponse,
        params: &RequestParams,
    ) -> Result<Vec<EngineResult>, EngineError> {
        let body: SearchResponse = response.json()?;

        let results = body
            .results
            .into_iter()
            .filter(|item| !item.url.is_empty())
            .take(params.max_results)
            .enumerate()
            .map(|(i, item)| {
                let title = if item.title.is_empty() {
                    item.url.clone()
                } else {
                    item.title
                };
                EngineResult::new(item.url, title, self.name())
                    .with_snippet(item.content.unwrap_or_default())
                    .with_rank(i as u32 + 1)
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::HttpEngine;
    use crate::network::HttpClient;
    use crate::engines::SearchAdapter;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_request_uses_instance() {
        let engine = SearXNG::with_instance("https://search.example.org/");
        let request = engine.request(&RequestParams::new("rust", 10)).unwrap();
        assert_eq!(request.url, "https://search.example.org/search");
        assert_eq!(request.param_value("format"), Some("json"));
    }

    #[test]
    fn test_rejects_non_http_instance() {
        let mut engine = SearXNG::new();
        let config = EngineConfig {
            base_url: Some("ftp://example.org".to_string()),
            ..EngineConfig::new("searxng", 0.6)
        };
        assert!(engine.init(&config).is_err());
    }

    #[tokio::test]
    async fn test_search_against_instance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "quantum computing"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": "quantum computing",
                "results": [
                    {"url": "https://example.com/a", "title": "A", "content": "first", "engine": "bing"},
                    {"url": "", "title": "no url"},
                    {"url": "https://example.com/b", "title": "B"}
                ]
            })))
            .mount(&server)
            .await;

        let adapter = HttpEngine::new(
            "searxng",
            Box::new(SearXNG::with_instance(server.uri())),
            HttpClient::new().unwrap(),
        );
        let results = adapter
            .search("quantum computing", 10, Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].snippet, "first");
        assert_eq!(results[1].raw_rank, 2);
        assert_eq!(results[1].snippet, "");
    }
}
