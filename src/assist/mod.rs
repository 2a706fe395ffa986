//! Optional language-model assist
//!
//! Used for query breakdown and result summaries. Every caller treats a
//! failure here as a signal to fall back to the rule-based path.

use crate::config::AssistSettings;
use crate::engines::EngineRequest;
use crate::network::HttpClient;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Language-model errors; never surfaced to search callers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssistError {
    #[error("model unavailable: {0}")]
    Unavailable(String),
    #[error("model returned HTTP error: {0}")]
    Http(String),
    #[error("malformed model response: {0}")]
    Malformed(String),
    #[error("model call timed out")]
    Timeout,
}

/// A text-completion model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier for logging
    fn name(&self) -> &str;

    /// Complete `prompt`, giving up after `timeout`
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, AssistError>;
}

/// Ollama's `/api/generate` endpoint
pub struct Ollama {
    host: String,
    model: String,
    client: HttpClient,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl Ollama {
    pub fn new(host: impl Into<String>, model: impl Into<String>, client: HttpClient) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        }
    }

    pub fn from_settings(settings: &AssistSettings, client: HttpClient) -> Self {
        Self::new(&settings.host, &settings.model, client)
    }
}

#[async_trait]
impl LanguageModel for Ollama {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, AssistError> {
        let request = EngineRequest::post(format!("{}/api/generate", self.host)).json(
            serde_json::json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
            }),
        );

        let response = self
            .client
            .execute_with_timeout(request, timeout)
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AssistError::Timeout
                } else {
                    AssistError::Unavailable(e.to_string())
                }
            })?;

        if !response.is_success() {
            return Err(AssistError::Http(format!("HTTP {}", response.status)));
        }

        let body: GenerateResponse = serde_json::from_str(&response.text)
            .map_err(|e| AssistError::Malformed(e.to_string()))?;
        Ok(body.response.trim().to_string())
    }
}
