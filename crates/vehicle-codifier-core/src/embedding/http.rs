//! HTTP embedding provider.
//!
//! Calls an external embedding endpoint implementing the `embed(text) ->
//! vector` contract from spec.md §6. Errors are reported as
//! `PipelineError::EmbeddingUnavailable`, which the reranker (C8B) treats as
//! a local degradation, not a request failure.

use super::EmbeddingProvider;
use crate::error::PipelineError;
use crate::math::l2_normalize;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct HttpEmbeddingProvider {
    endpoint: String,
    dimension: usize,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpEmbeddingProvider {
    pub fn new(endpoint: &str, dimension: usize, timeout_ms: u64) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            dimension,
            timeout: Duration::from_millis(timeout_ms),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { text })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PipelineError::EmbeddingUnavailable {
                message: format!("request failed: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::EmbeddingUnavailable {
                message: format!("HTTP {status}: {text}"),
            });
        }

        let body: EmbedResponse =
            resp.json()
                .await
                .map_err(|e| PipelineError::EmbeddingUnavailable {
                    message: format!("failed to parse response: {e}"),
                })?;

        if body.embedding.len() != self.dimension {
            return Err(PipelineError::EmbeddingUnavailable {
                message: format!(
                    "expected dimension {}, got {}",
                    self.dimension,
                    body.embedding.len()
                ),
            });
        }

        Ok(l2_normalize(&body.embedding))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_reports_configured_dimension() {
        let provider = HttpEmbeddingProvider::new("http://localhost:8081/embed", 384, 5000);
        assert_eq!(provider.dimension(), 384);
    }
}
