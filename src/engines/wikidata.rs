//! Wikidata entity search

use super::traits::*;
use crate::config::EngineConfig;
use crate::results::{EngineError, EngineResult};
use serde::Deserialize;

/// Wikidata structured knowledge base, searched with `wbsearchentities`
pub struct Wikidata {
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    search: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
struct Entity {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl Wikidata {
    pub fn new() -> Self {
        Self {
            api_url: "https://www.wikidata.org/w/api.php".to_string(),
        }
    }
}

impl Default for Wikidata {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Wikidata {
    fn name(&self) -> &str {
        "wikidata"
    }

    fn init(&mut self, config: &EngineConfig) -> anyhow::Result<()> {
        if let Some(ref url) = config.base_url {
            self.api_url = url.clone();
        }
        Ok(())
    }

    fn request(&self, params: &RequestParams) -> Result<EngineRequest, EngineError> {
        Ok(EngineRequest::get(&self.api_url)
            .param("action", "wbsearchentities")
            .param("search", &params.query)
            .param("language", &params.lang)
            .param("type", "item")
            .param("limit", params.max_results.min(50))
            .param("format", "json"))
    }

    fn response(
        &self,
        response: EngineResponse,
        params: &RequestParams,
    ) -> Result<Vec<EngineResult>, EngineError> {
        let body: SearchResponse = response.json()?;

        let results = body
            .search
            .into_iter()
            .take(params.max_results)
            .enumerate()
            .map(|(i, entity)| {
                let label = entity.label.unwrap_or_else(|| entity.id.clone());
                let snippet = entity
                    .description
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| format!("Wikidata entity: {}", label));
                EngineResult::new(
                    format!("https://www.wikidata.org/wiki/{}", entity.id),
                    label,
                    self.name(),
                )
                .with_snippet(snippet)
                .with_rank(i as u32 + 1)
            })
            .collect();

        Ok(results)
    }
}
