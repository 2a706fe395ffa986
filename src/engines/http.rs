//! Adapter that runs an `Engine` over HTTP

use super::traits::{Engine, RequestParams, SearchAdapter};
use crate::network::HttpClient;
use crate::results::{EngineError, EngineResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Executes an `Engine`'s request with the shared client and parses the reply
pub struct HttpEngine {
    name: String,
    engine: Box<dyn Engine>,
    client: HttpClient,
}

impl HttpEngine {
    /// Wrap an engine under the configured instance name
    pub fn new(name: impl Into<String>, engine: Box<dyn Engine>, client: HttpClient) -> Self {
        Self {
            name: name.into(),
            engine,
            client,
        }
    }

    /// Adapter type behind this instance
    pub fn engine_type(&self) -> &str {
        self.engine.name()
    }
}

fn map_transport_error(err: reqwest::Error) -> EngineError {
    if err.is_timeout() {
        EngineError::Timeout
    } else if err.is_decode() || err.is_body() {
        EngineError::ParseFailure(err.to_string())
    } else {
        EngineError::Unreachable(err.to_string())
    }
}

#[async_trait]
impl SearchAdapter for HttpEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        sub_query: &str,
        max_results: usize,
        timeout: Duration,
    ) -> Result<Vec<EngineResult>, EngineError> {
        let params = RequestParams::new(sub_query, max_results);
        let request = self.engine.request(&params)?;

        debug!("{}: requesting {}", self.name, request.url);
        let response = self
            .client
            .execute_with_timeout(request, timeout)
            .await
            .map_err(map_transport_error)?;

        if response.is_rate_limited() {
            return Err(EngineError::RateLimited);
        }
        if !response.is_success() {
            return Err(EngineError::Unreachable(format!("HTTP {}", response.status)));
        }

        let mut results = self.engine.response(response, &params)?;
        results.truncate(max_results);
        for result in &mut results {
            result.source = self.name.clone();
        }
        Ok(results)
    }
}
