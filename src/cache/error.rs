//! Cache layer error type.
//!
//! `CacheError` is never surfaced to the pipeline orchestrator: every
//! public [`super::CacheLayer`] method catches it internally, logs it, and
//! returns a miss (`None`) instead.

use thiserror::Error;

/// Internal cache failure. Always caught at the [`super::CacheLayer`] boundary.
#[derive(Debug, Error)]
pub enum CacheError {
    /// JSON encoding/decoding failed.
    #[error("cache JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary (rkyv) encoding/decoding failed.
    #[error("cache binary codec error: {reason}")]
    Binary {
        /// Human-readable reason.
        reason: String,
    },

    /// The stored entry's version tag did not match the lookup's expected tag.
    #[error("version tag mismatch: stored '{stored}', expected '{expected}'")]
    VersionMismatch {
        /// Version tag found on the stored entry.
        stored: String,
        /// Version tag the caller expected.
        expected: String,
    },

    /// The entry was present but past its TTL.
    #[error("entry expired")]
    Expired,
}
