//! Embedding gateway: batch text → vector via an external HTTP
//! service, with dimension validation and an optional zero-vector fallback.
//!
//! Expressed as a trait (`EmbeddingGateway`) with one production
//! implementation ([`http::HttpEmbeddingGateway`], backed by `reqwest`) and
//! one mock implementation ([`mock::MockEmbeddingGateway`], gated behind
//! `#[cfg(any(test, feature = "mock"))]`) — the same pluggable-backend
//! idiom the lineage uses for its vector-store client.

pub mod error;
pub mod http;

#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use error::EmbeddingError;
pub use http::HttpEmbeddingGateway;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbeddingGateway;

use std::future::Future;

use crate::constants::MAX_EMBED_INPUT_BYTES;

/// The outcome of a batch embed call.
#[derive(Debug, Clone)]
pub struct EmbedResult {
    /// One vector per input, in input order, each of length `EMBED_DIM`.
    pub vectors: Vec<Vec<f32>>,
    /// `true` if the gateway fell back to zero vectors for this batch.
    pub degraded: bool,
}

/// Validates a batch of inputs before submission: non-empty, each ≤
/// [`MAX_EMBED_INPUT_BYTES`]. Shared by every implementation so the
/// contract ("Inputs: non-empty strings, each ≤ 8 KB") is enforced
/// uniformly.
pub fn validate_batch(batch: &[String]) -> Result<(), EmbeddingError> {
    for (index, text) in batch.iter().enumerate() {
        if text.is_empty() {
            return Err(EmbeddingError::EmptyInput { index });
        }
        if text.len() > MAX_EMBED_INPUT_BYTES {
            return Err(EmbeddingError::InputTooLarge {
                index,
                actual: text.len(),
                limit: MAX_EMBED_INPUT_BYTES,
            });
        }
    }
    Ok(())
}

/// Turns text into fixed-dimension vectors via an external service.
///
/// Implementations must preserve input order and return vectors of exactly
/// `expected_dim` length. On transport failure, an implementation either
/// returns `Err` or — if constructed with fallback enabled — returns `Ok`
/// with `degraded: true` and zero vectors. A dimension mismatch in
/// a real response is always `Err(EmbeddingError::DimensionMismatch)`, never
/// a fallback.
pub trait EmbeddingGateway: Send + Sync {
    /// Embeds `batch`, returning one vector per input in the same order.
    fn embed(
        &self,
        batch: &[String],
        expected_dim: u32,
    ) -> impl Future<Output = Result<EmbedResult, EmbeddingError>> + Send;
}
