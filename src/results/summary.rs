//! Result summaries, generated when a model is available

use super::synthesizer::Synthesis;
use crate::assist::LanguageModel;
use crate::query::Query;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Results shown to the model
const PROMPT_RESULTS: usize = 5;

/// Produces the final summary string; falls back to the synthesis template
#[derive(Clone, Default)]
pub struct Summarizer {
    model: Option<Arc<dyn LanguageModel>>,
    timeout: Duration,
}

impl Summarizer {
    /// Summarizer that always uses the template
    pub fn templated() -> Self {
        Self::default()
    }

    pub fn with_model(model: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self {
            model: Some(model),
            timeout,
        }
    }

    /// Summary for `synthesis`; never fails
    pub async fn summarize(&self, query: &Query, synthesis: &Synthesis) -> String {
        let model = match self.model {
            Some(ref model) if !synthesis.results.is_empty() => model,
            _ => return synthesis.summary.clone(),
        };

        let prompt = build_prompt(query, synthesis);
        match tokio::time::timeout(self.timeout, model.generate(&prompt, self.timeout)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(Ok(_)) => {
                warn!("Summary model returned an empty answer, using template");
                synthesis.summary.clone()
            }
            Ok(Err(e)) => {
                warn!("Summary generation failed, using template: {}", e);
                synthesis.summary.clone()
            }
            Err(_) => {
                warn!("Summary generation timed out, using template");
                synthesis.summary.clone()
            }
        }
    }
}

fn build_prompt(query: &Query, synthesis: &Synthesis) -> String {
    let mut prompt = format!(
        "Summarize what these search results say about \"{}\" in two or three sentences.\n\n",
        query
    );
    for (i, result) in synthesis.results.iter().take(PROMPT_RESULTS).enumerate() {
        let _ = writeln!(
            prompt,
            "{}. {} ({})\n   {}",
            i + 1,
            result.title(),
            result.url(),
            result.snippet()
        );
    }
    prompt.push_str("\nRespond with the summary only.");
    prompt
}
