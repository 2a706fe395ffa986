//! DuckDuckGo Instant Answer API

use super::traits::*;
use crate::config::EngineConfig;
use crate::results::{EngineError, EngineResult};
use serde::Deserialize;

/// DuckDuckGo instant answers: abstract, results and related topics
pub struct DuckDuckGo {
    api_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct InstantAnswer {
    heading: String,
    abstract_text: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    results: Vec<Topic>,
    related_topics: Vec<Topic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Topic {
    #[serde(rename = "FirstURL")]
    first_url: String,
    text: String,
    /// Present on topic groups instead of a URL
    topics: Vec<Topic>,
}

impl DuckDuckGo {
    pub fn new() -> Self {
        Self {
            api_url: "https://api.duckduckgo.com/".to_string(),
        }
    }

    fn push_topic(topic: Topic, out: &mut Vec<(String, String, String)>) {
        if !topic.topics.is_empty() {
            for sub in topic.topics {
                Self::push_topic(sub, out);
            }
            return;
        }
        if topic.first_url.is_empty() || topic.text.is_empty() {
            return;
        }
        let title = topic
            .text
            .split(" - ")
            .next()
            .unwrap_or(&topic.text)
            .to_string();
        out.push((topic.first_url, title, topic.text));
    }
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
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
            .param("format", "json")
            .param("no_html", 1)
            .param("skip_disambig", 1))
    }

    fn response(
        &self,
        response: EngineResponse,
        params: &RequestParams,
    ) -> Result<Vec<EngineResult>, EngineError> {
        let answer: InstantAnswer = response.json()?;

        // (url, title, snippet)
        let mut hits = Vec::new();
        if !answer.abstract_url.is_empty() && !answer.abstract_text.is_empty() {
            let title = if answer.heading.is_empty() {
                answer.abstract_url.clone()
            } else {
                answer.heading
            };
            hits.push((answer.abstract_url, title, answer.abstract_text));
        }
        for topic in answer.results.into_iter().chain(answer.related_topics) {
            Self::push_topic(topic, &mut hits);
        }

        let results = hits
            .into_iter()
            .take(params.max_results)
            .enumerate()
            .map(|(i, (url, title, snippet))| {
                EngineResult::new(url, title, self.name())
                    .with_snippet(snippet)
                    .with_rank(i as u32 + 1)
            })
            .collect();

        Ok(results)
    }
}
