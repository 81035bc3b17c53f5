//! Production [`EmbeddingGateway`] backed by an external HTTP service.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use super::error::EmbeddingError;
use super::{EmbedResult, EmbeddingGateway, validate_batch};

#[derive(Serialize)]
struct EmbedRequestBody<'a> {
    inputs: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponseBody {
    embeddings: Vec<Vec<f32>>,
    dim: u32,
}

/// Calls `EMBED_ENDPOINT` with `POST { "inputs": [...] }`, expecting
/// `{ "embeddings": [[...]], "dim": N }` back (§6).
pub struct HttpEmbeddingGateway {
    client: reqwest::Client,
    endpoint: String,
    allow_fallback: bool,
}

impl HttpEmbeddingGateway {
    /// Builds a gateway targeting `endpoint`, with a per-request `timeout`
    /// and the configured fallback policy (`ALLOW_EMBED_FALLBACK`).
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        allow_fallback: bool,
    ) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::RequestFailed {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            allow_fallback,
        })
    }

    fn zero_vectors(expected_dim: u32, count: usize) -> Vec<Vec<f32>> {
        vec![vec![0.0; expected_dim as usize]; count]
    }
}

impl EmbeddingGateway for HttpEmbeddingGateway {
    #[instrument(skip(self, batch), fields(batch_len = batch.len()))]
    async fn embed(&self, batch: &[String], expected_dim: u32) -> Result<EmbedResult, EmbeddingError> {
        validate_batch(batch)?;

        let body = EmbedRequestBody { inputs: batch };
        let response = self.client.post(&self.endpoint).json(&body).send().await;

        let response = match response {
            Ok(resp) => resp,
            Err(e) => return self.fallback_or_fail(batch.len(), expected_dim, e.to_string()),
        };

        if !response.status().is_success() {
            let status = response.status();
            return self.fallback_or_fail(batch.len(), expected_dim, format!("non-2xx status: {status}"));
        }

        let parsed: EmbedResponseBody = response
            .json()
            .await
            .map_err(|e| EmbeddingError::DecodeFailed {
                reason: e.to_string(),
            })?;

        if parsed.embeddings.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                sent: batch.len(),
                received: parsed.embeddings.len(),
            });
        }

        // A dimension mismatch is always fatal, even with fallback enabled (§4.4).
        if parsed.dim != expected_dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: expected_dim,
                actual: parsed.dim,
            });
        }
        for vector in &parsed.embeddings {
            if vector.len() != expected_dim as usize {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: expected_dim,
                    actual: vector.len() as u32,
                });
            }
        }

        Ok(EmbedResult {
            vectors: parsed.embeddings,
            degraded: false,
        })
    }
}

impl HttpEmbeddingGateway {
    fn fallback_or_fail(
        &self,
        batch_len: usize,
        expected_dim: u32,
        reason: String,
    ) -> Result<EmbedResult, EmbeddingError> {
        if self.allow_fallback {
            warn!(%reason, "embedding request failed, falling back to zero vectors");
            Ok(EmbedResult {
                vectors: Self::zero_vectors(expected_dim, batch_len),
                degraded: true,
            })
        } else {
            Err(EmbeddingError::RequestFailed { reason })
        }
    }
}
