//! Embedding gateway error type.

use thiserror::Error;

/// Errors returned by an [`super::EmbeddingGateway`] implementation.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// An input string was empty.
    #[error("embedding input at index {index} is empty")]
    EmptyInput {
        /// Index of the offending input within the batch.
        index: usize,
    },

    /// An input string exceeded the per-text byte limit.
    #[error("embedding input at index {index} is {actual} bytes, exceeding the {limit}-byte limit")]
    InputTooLarge {
        /// Index of the offending input within the batch.
        index: usize,
        /// Actual byte length.
        actual: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The HTTP call to the embedding service failed (connection, timeout, or non-2xx status)
    /// and fallback was not permitted (`ALLOW_EMBED_FALLBACK=false`).
    #[error("embedding request failed: {reason}")]
    RequestFailed {
        /// Human-readable reason.
        reason: String,
    },

    /// The embedding service's response body could not be decoded.
    #[error("embedding response decode failed: {reason}")]
    DecodeFailed {
        /// Human-readable reason.
        reason: String,
    },

    /// The service returned a different vector count than inputs submitted.
    #[error("embedding count mismatch: sent {sent} inputs, received {received} vectors")]
    CountMismatch {
        /// Number of inputs submitted.
        sent: usize,
        /// Number of vectors received.
        received: usize,
    },

    /// A returned vector's dimension did not match `EMBED_DIM`. This is
    /// always fatal, even when `ALLOW_EMBED_FALLBACK=true` — dimension
    /// mismatches never fall back.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension (`EMBED_DIM`).
        expected: u32,
        /// Actual dimension observed.
        actual: u32,
    },
}
