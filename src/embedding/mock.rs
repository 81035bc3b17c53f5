//! In-memory [`EmbeddingGateway`] for tests and the `mock` feature.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::error::EmbeddingError;
use super::{EmbedResult, EmbeddingGateway, validate_batch};

/// Deterministically hashes text into a vector via [`crate::hashing`], so
/// tests get stable, distinguishable embeddings without a real model.
pub struct MockEmbeddingGateway {
    call_count: AtomicUsize,
    fail_next: std::sync::atomic::AtomicBool,
}

impl MockEmbeddingGateway {
    /// Builds a mock gateway.
    pub fn new() -> Self {
        Self {
            call_count: AtomicUsize::new(0),
            fail_next: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Returns the number of times [`EmbeddingGateway::embed`] has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Makes the next `embed` call return [`EmbeddingError::RequestFailed`].
    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn deterministic_vector(text: &str, dim: u32) -> Vec<f32> {
        let seed = crate::hashing::hash_to_u64(text.as_bytes());
        (0..dim)
            .map(|i| {
                let mixed = seed.wrapping_add(i as u64).wrapping_mul(2_654_435_761);
                ((mixed % 2000) as f32 / 1000.0) - 1.0
            })
            .collect()
    }
}

impl Default for MockEmbeddingGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingGateway for MockEmbeddingGateway {
    async fn embed(&self, batch: &[String], expected_dim: u32) -> Result<EmbedResult, EmbeddingError> {
        validate_batch(batch)?;
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(EmbeddingError::RequestFailed {
                reason: "mock gateway forced failure".to_string(),
            });
        }

        let vectors = batch
            .iter()
            .map(|text| Self::deterministic_vector(text, expected_dim))
            .collect();

        Ok(EmbedResult {
            vectors,
            degraded: false,
        })
    }
}
