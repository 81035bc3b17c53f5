//! Scoring error type, shared by the conceptual and LTR scorers.

use thiserror::Error;

/// Errors raised while scoring candidates.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The LTR model artifact's coefficient count didn't match the active
    /// feature schema's field count. Always fatal.
    #[error("LTR model schema mismatch: model has {model_features} coefficient(s), schema v{schema_version} has {schema_features} field(s)")]
    ModelSchemaError {
        /// Coefficient count carried by the model artifact.
        model_features: usize,
        /// Feature count defined by the active schema.
        schema_features: usize,
        /// The schema version involved.
        schema_version: u32,
    },

    /// The model artifact string could not be parsed into coefficients.
    #[error("malformed LTR model artifact: {reason}")]
    MalformedArtifact {
        /// Human-readable reason.
        reason: String,
    },
}
