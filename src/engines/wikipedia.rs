//! Wikipedia search engine implementation

use super::traits::*;
use crate::config::EngineConfig;
use crate::results::{EngineError, EngineResult};

/// Wikipedia article search via the opensearch API
pub struct Wikipedia {
    api_url: String,
}

impl Wikipedia {
    pub fn new() -> Self {
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
        }
    }
}

impl Default for Wikipedia {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Wikipedia {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn init(&mut self, config: &EngineConfig) -> anyhow::Result<()> {
        if let Some(ref url) = config.base_url {
            self.api_url = url.clone();
        }
        Ok(())
    }

    fn request(&self, params: &RequestParams) -> Result<EngineRequest, EngineError> {
        Ok(EngineRequest::get(&self.api_url)
            .param("action", "opensearch")
            .param("search", &params.query)
            .param("limit", params.max_results)
            .param("namespace", 0)
            .param("format", "json"))
    }

    fn response(
        &self,
        response: EngineResponse,
        params: &RequestParams,
    ) -> Result<Vec<EngineResult>, EngineError> {
        // [query, [titles], [descriptions], [urls]]
        let (_, titles, descriptions, urls): (String, Vec<String>, Vec<String>, Vec<String>) =
            response.json()?;

        let results = titles
            .into_iter()
            .zip(urls)
            .enumerate()
            .take(params.max_results)
            .map(|(i, (title, url))| {
                let snippet = descriptions
                    .get(i)
                    .filter(|d| !d.is_empty())
                    .cloned()
                    .unwrap_or_else(|| format!("Wikipedia article for {}", title));
                EngineResult::new(url, title, self.name())
                    .with_snippet(truncate_text(&snippet, 500))
                    .with_rank(i as u32 + 1)
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn response(text: &str) -> EngineResponse {
        EngineResponse {
            status: 200,
            headers: HashMap::new(),
            text: text.to_string(),
            url: "https://en.wikipedia.org/w/api.php".to_string(),
        }
    }

    #[test]
    fn test_wikipedia_request() {
        let wiki = Wikipedia::new();
        let params = RequestParams::new("rust programming", 5);
        let request = wiki.request(&params).unwrap();

        assert!(request.url.contains("wikipedia.org"));
        assert_eq!(request.param_value("action"), Some("opensearch"));
        assert_eq!(request.param_value("search"), Some("rust programming"));
        assert_eq!(request.param_value("limit"), Some("5"));
    }

    #[test]
    fn test_parse_opensearch() {
        let body = r#"["quantum",
            ["Quantum computing", "Quantum mechanics"],
            ["", "Physics of the very small"],
            ["https://en.wikipedia.org/wiki/Quantum_computing", "https://en.wikipedia.org/wiki/Quantum_mechanics"]]"#;
        let wiki = Wikipedia::new();
        let results = wiki
            .response(response(body), &RequestParams::new("quantum", 10))
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Quantum computing");
        assert_eq!(results[0].snippet, "Wikipedia article for Quantum computing");
        assert_eq!(results[0].raw_rank, 1);
        assert_eq!(results[1].snippet, "Physics of the very small");
        assert_eq!(results[1].raw_rank, 2);
    }

    #[test]
    fn test_malformed_body() {
        let wiki = Wikipedia::new();
        let err = wiki
            .response(response("{\"error\":{}}"), &RequestParams::new("q", 10))
            .unwrap_err();
        assert!(matches!(err, EngineError::ParseFailure(_)));
    }

    #[test]
    fn test_base_url_override() {
        let mut wiki = Wikipedia::new();
        let config = EngineConfig {
            base_url: Some("http://127.0.0.1:9000/api.php".to_string()),
            ..EngineConfig::new("wikipedia", 1.0)
        };
        wiki.init(&config).unwrap();
        let request = wiki.request(&RequestParams::new("q", 1)).unwrap();
        assert_eq!(request.url, "http://127.0.0.1:9000/api.php");
    }
}
