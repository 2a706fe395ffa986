//! Qwant web search (v3 API)

use super::traits::*;
use crate::config::EngineConfig;
use crate::results::{EngineError, EngineResult};
use serde::Deserialize;
use serde_json::Value;

/// Qwant privacy-focused web search
pub struct Qwant {
    api_url: String,
    locale: String,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    desc: String,
}

impl Qwant {
    pub fn new() -> Self {
        Self {
            api_url: "https://api.qwant.com/v3/search/web".to_string(),
            locale: "en_US".to_string(),
        }
    }

    /// Items either sit directly under `result.items` or are grouped by
    /// type under `result.items.mainline`.
    fn web_items(data: &Value) -> Vec<Value> {
        let items = &data["data"]["result"]["items"];
        if let Some(list) = items.as_array() {
            return list.clone();
        }
        items["mainline"]
            .as_array()
            .map(|groups| {
                groups
                    .iter()
                    .filter(|g| g["type"] == "web")
                    .filter_map(|g| g["items"].as_array())
                    .flatten()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for Qwant {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Qwant {
    fn name(&self) -> &str {
        "qwant"
    }

    fn init(&mut self, config: &EngineConfig) -> anyhow::Result<()> {
        if let Some(ref url) = config.base_url {
            self.api_url = url.clone();
        }
        Ok(())
    }

    fn request(&self, params: &RequestParams) -> Result<EngineRequest, EngineError> {
        Ok(EngineRequest::get(&self.api_url)
            .param("q", &params.query)
            .param("count", params.max_results.min(10))
            .param("t", "web")
            .param("locale", &self.locale)
            .param("safesearch", 1)
            .header("Referer", "https://www.qwant.com/")
            .header("Origin", "https://www.qwant.com"))
    }

    fn response(
        &self,
        response: EngineResponse,
        params: &RequestParams,
    ) -> Result<Vec<EngineResult>, EngineError> {
        let data: Value = response.json()?;
        if data["status"] == "error" {
            return Err(EngineError::ParseFailure(format!(
                "qwant error: {}",
                data["data"]["error_code"]
            )));
        }

        let mut results = Vec::new();
        for value in Self::web_items(&data) {
            let item: Item = serde_json::from_value(value)?;
            if item.url.is_empty() {
                continue;
            }
            let title = if item.title.is_empty() {
                item.url.clone()
            } else {
                item.title
            };
            let rank = results.len() as u32 + 1;
            results.push(
                EngineResult::new(item.url, title, self.name())
                    .with_snippet(item.desc)
                    .with_rank(rank),
            );
            if results.len() >= params.max_results {
                break;
            }
        }

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
            url: String::new(),
        }
    }

    #[test]
    fn test_request_caps_count() {
        let request = Qwant::new().request(&RequestParams::new("rust", 25)).unwrap();
        assert_eq!(request.param_value("count"), Some("10"));
        assert_eq!(request.param_value("locale"), Some("en_US"));
    }

    #[test]
    fn test_parse_mainline() {
        let body = r#"{"status": "success", "data": {"result": {"items": {"mainline": [
            {"type": "ads", "items": [{"url": "https://ad.example", "title": "Ad"}]},
            {"type": "web", "items": [
                {"url": "https://a.example", "title": "A", "desc": "first"},
                {"url": "https://b.example", "title": "", "desc": "second"}
            ]}
        ]}}}}"#;
        let results = Qwant::new()
            .response(response(body), &RequestParams::new("rust", 10))
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://a.example");
        assert_eq!(results[1].title, "https://b.example");
        assert_eq!(results[1].raw_rank, 2);
    }

    #[test]
    fn test_parse_flat_items() {
        let body = r#"{"status": "success", "data": {"result": {"items": [
            {"url": "https://a.example", "title": "A", "desc": "first"}
        ]}}}"#;
        let results = Qwant::new()
            .response(response(body), &RequestParams::new("rust", 10))
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_error_status() {
        let body = r#"{"status": "error", "data": {"error_code": 24}}"#;
        let err = Qwant::new()
            .response(response(body), &RequestParams::new("rust", 10))
            .unwrap_err();
        assert!(matches!(err, EngineError::ParseFailure(_)));
    }
}
