//! In-memory [`VectorRetriever`] for tests and the `mock` feature.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::VectorRetriever;
use super::error::RetrievalError;
use crate::domain::Candidate;

/// Holds a fixed pool of candidates per collection and returns the closest
/// `limit` of them by brute-force cosine distance, mirroring ANN semantics
/// without a real index.
#[derive(Default)]
pub struct MockVectorRetriever {
    collections: Mutex<HashMap<String, Vec<(Vec<f32>, Candidate)>>>,
    fail_next: std::sync::atomic::AtomicBool,
    /// When set, `search_partial` delivers one candidate to its sink every
    /// `delay` instead of the whole batch at once, so a caller racing it
    /// against a shorter deadline observes a genuinely partial result.
    stream_delay: Mutex<Option<Duration>>,
}

impl MockVectorRetriever {
    /// Builds an empty mock retriever.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `collection` with a `(vector, candidate)` pair.
    pub fn seed(&self, collection: &str, vector: Vec<f32>, candidate: Candidate) {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push((vector, candidate));
    }

    /// Makes the next `search` call return [`RetrievalError::SearchFailed`].
    pub fn fail_next_call(&self) {
        self.fail_next
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Makes subsequent `search_partial` calls deliver one candidate to the
    /// sink every `delay`, instead of the full batch on completion — used to
    /// test a caller's behavior when a deadline cuts a search short.
    pub fn stream_with_delay(&self, delay: Duration) {
        *self.stream_delay.lock().unwrap() = Some(delay);
    }

    fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
        if a.len() != b.len() || a.is_empty() {
            return 1.0;
        }
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 1.0;
        }
        let cosine_sim = (dot / (norm_a * norm_b)) as f64;
        (1.0 - cosine_sim).clamp(0.0, 2.0)
    }
}

impl MockVectorRetriever {
    /// Shared ranking logic behind both `search` and `search_partial`:
    /// filter by tenant, score by cosine distance, sort ascending, truncate
    /// to `limit`.
    fn ranked_candidates(
        &self,
        collection: &str,
        query_vector: &[f32],
        limit: u64,
        tenant: Option<&str>,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        if self
            .fail_next
            .swap(false, std::sync::atomic::Ordering::SeqCst)
        {
            return Err(RetrievalError::SearchFailed {
                collection: collection.to_string(),
                message: "mock retriever forced failure".to_string(),
            });
        }

        let collections = self.collections.lock().unwrap();
        let Some(pool) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(f64, Candidate)> = pool
            .iter()
            .filter(|(_, candidate)| match tenant {
                Some(t) => candidate
                    .metadata
                    .get("tenant_id")
                    .and_then(|v| v.as_str())
                    .map(|v| v == t)
                    .unwrap_or(false),
                None => true,
            })
            .map(|(vector, candidate)| (Self::cosine_distance(query_vector, vector), candidate.clone()))
            .collect();

        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(limit as usize);

        Ok(scored
            .into_iter()
            .map(|(distance, mut candidate)| {
                candidate.distance = distance;
                candidate
            })
            .collect())
    }
}

impl VectorRetriever for MockVectorRetriever {
    async fn search(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
        tenant: Option<&str>,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        self.ranked_candidates(collection, &query_vector, limit, tenant)
    }

    async fn search_partial(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
        tenant: Option<&str>,
        sink: Arc<Mutex<Vec<Candidate>>>,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        let delay = *self.stream_delay.lock().unwrap();
        let Some(delay) = delay else {
            let candidates = self.ranked_candidates(collection, &query_vector, limit, tenant)?;
            *sink.lock().unwrap() = candidates.clone();
            return Ok(candidates);
        };

        let candidates = self.ranked_candidates(collection, &query_vector, limit, tenant)?;
        for candidate in &candidates {
            tokio::time::sleep(delay).await;
            sink.lock().unwrap().push(candidate.clone());
        }
        Ok(candidates)
    }
}
