//! Configuration and registry error types.

use thiserror::Error;

/// Errors that can occur during configuration loading, validation, or
/// registry publication (weight sets, model entries).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was not set.
    #[error("missing required environment variable: {name}")]
    MissingEnvVar {
        /// The variable name.
        name: &'static str,
    },

    /// An environment variable could not be parsed as the expected type.
    #[error("failed to parse '{name}'='{value}' as {expected}")]
    InvalidValue {
        /// The variable name.
        name: &'static str,
        /// The raw string value that failed to parse.
        value: String,
        /// A short description of the expected type/shape.
        expected: &'static str,
    },

    /// `EMBED_DIM` (or a runtime embedding result) disagreed with the
    /// dimension the vector retriever expects.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: u32,
        /// Actual dimension observed.
        actual: u32,
    },

    /// A weight set failed validation at publish time.
    #[error("invalid weight set: {reason}")]
    InvalidWeightSet {
        /// Human-readable reason.
        reason: String,
    },

    /// A model entry failed validation at registration time.
    #[error("invalid model entry '{name}': {reason}")]
    InvalidModelEntry {
        /// The model entry's name.
        name: String,
        /// Human-readable reason.
        reason: String,
    },
}
