//! Production [`VectorRetriever`] backed by Qdrant.

use std::collections::HashMap;
use std::time::Duration;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{Condition, Filter, SearchPointsBuilder, point_id::PointIdOptions};
use tracing::{instrument, warn};

use super::VectorRetriever;
use super::error::RetrievalError;
use crate::constants::{
    RETRIEVAL_BACKOFF_CAP_MS, RETRIEVAL_BACKOFF_FACTOR, RETRIEVAL_BACKOFF_INITIAL_MS,
    RETRIEVAL_MAX_ATTEMPTS,
};
use crate::domain::Candidate;

/// Thin wrapper over a [`Qdrant`] client with bounded retry/backoff on search
/// (doubling delay from an initial 50ms up to a 1s cap, over
/// [`RETRIEVAL_MAX_ATTEMPTS`] attempts).
#[derive(Clone)]
pub struct QdrantVectorRetriever {
    client: Qdrant,
}

impl QdrantVectorRetriever {
    /// Builds a retriever against `url`.
    pub fn new(url: &str) -> Result<Self, RetrievalError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| RetrievalError::ConnectionFailed {
                attempts: 0,
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    fn backoff_delay(attempt: u32) -> Duration {
        let scaled = RETRIEVAL_BACKOFF_INITIAL_MS.saturating_mul(
            RETRIEVAL_BACKOFF_FACTOR.saturating_pow(attempt.saturating_sub(1)) as u64,
        );
        Duration::from_millis(scaled.min(RETRIEVAL_BACKOFF_CAP_MS))
    }

    fn candidate_from_payload(
        point_id: u64,
        score: f32,
        payload: HashMap<String, qdrant_client::qdrant::Value>,
    ) -> Option<Candidate> {
        let chunk_id = payload
            .get("chunk_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| point_id.to_string());
        let document_id = payload
            .get("document_id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let ordinal = payload
            .get("ordinal")
            .and_then(|v| v.as_integer())
            .unwrap_or(0) as u32;
        let text = payload
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let token_count = payload
            .get("token_count")
            .and_then(|v| v.as_integer())
            .map(|i| i as u32);
        let provenance = payload
            .get("provenance")
            .and_then(|v| v.as_str())
            .unwrap_or("qdrant")
            .to_string();

        let metadata = payload
            .get("metadata")
            .and_then(|v| v.as_str())
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();

        // Qdrant reports similarity (higher is closer); the core's `distance`
        // contract is "ascending = closer", so store `1.0 - score` as the
        // distance to keep candidates sortable the same way regardless of
        // which metric the collection was configured with.
        let distance = (1.0 - score as f64).max(0.0);

        Some(Candidate {
            chunk_id,
            document_id,
            ordinal,
            text,
            token_count,
            distance,
            provenance,
            metadata,
        })
    }
}

impl VectorRetriever for QdrantVectorRetriever {
    #[instrument(skip(self, query_vector), fields(collection, limit))]
    async fn search(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
        tenant: Option<&str>,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        let mut last_error = String::new();

        for attempt in 1..=RETRIEVAL_MAX_ATTEMPTS {
            let mut builder =
                SearchPointsBuilder::new(collection, query_vector.clone(), limit).with_payload(true);
            if let Some(tenant_id) = tenant {
                let filter = Filter::must([Condition::matches("tenant_id", tenant_id.to_string())]);
                builder = builder.filter(filter);
            }

            match self.client.search_points(builder).await {
                Ok(response) => {
                    let candidates = response
                        .result
                        .into_iter()
                        .filter_map(|point| {
                            let point_id = match point.id.and_then(|pid| pid.point_id_options) {
                                Some(PointIdOptions::Num(n)) => n,
                                _ => return None,
                            };
                            Self::candidate_from_payload(point_id, point.score, point.payload)
                        })
                        .collect();
                    return Ok(candidates);
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < RETRIEVAL_MAX_ATTEMPTS {
                        warn!(attempt, error = %last_error, "retrieval search failed, retrying");
                        tokio::time::sleep(Self::backoff_delay(attempt)).await;
                    }
                }
            }
        }

        Err(RetrievalError::SearchFailed {
            collection: collection.to_string(),
            message: last_error,
        })
    }
}
