//! Pipeline error type: the orchestrator's aggregate failure surface.
//!
//! `CacheError` is deliberately absent — cache failures are caught and
//! converted to misses at the cache layer boundary and never reach here.

use thiserror::Error;

use crate::config::ConfigError;
use crate::embedding::EmbeddingError;
use crate::retrieval::RetrievalError;
use crate::scoring::ScoringError;

/// Errors the pipeline orchestrator can return from [`super::Orchestrator::query`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Startup or dimension/schema configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The embedding gateway failed and fallback was disabled or exhausted.
    #[error(transparent)]
    Embed(#[from] EmbeddingError),

    /// The vector store failed and no partial result was usable.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// The LTR model's feature schema didn't match the active feature schema.
    #[error(transparent)]
    ModelSchema(#[from] ScoringError),

    /// A stage exceeded its deadline.
    #[error("stage '{stage}' exceeded its deadline")]
    Timeout {
        /// The stage that timed out.
        stage: &'static str,
    },

    /// A backpressure queue overflowed.
    #[error("request rejected: {resource} backpressure queue is full")]
    Overload {
        /// Which backpressure-limited resource rejected the request.
        resource: &'static str,
    },

    /// The request itself was malformed.
    #[error("invalid request: {reason}")]
    Input {
        /// Human-readable reason.
        reason: String,
    },
}

impl PipelineError {
    /// The stable error-kind label used in the structured failure envelope
    /// (`{ error_kind, message, stage, request_id }`).
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Config(_) => "ConfigError",
            PipelineError::Embed(_) => "EmbedError",
            PipelineError::Retrieval(_) => "RetrievalError",
            PipelineError::ModelSchema(_) => "ModelSchemaError",
            PipelineError::Timeout { .. } => "TimeoutError",
            PipelineError::Overload { .. } => "OverloadError",
            PipelineError::Input { .. } => "InputError",
        }
    }
}
