//! Vector retriever error type.

use thiserror::Error;

/// Errors returned by a [`super::VectorRetriever`] implementation.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Could not connect to the vector store after exhausting retries.
    #[error("vector store connection failed after {attempts} attempt(s): {message}")]
    ConnectionFailed {
        /// Attempts made, including the initial one.
        attempts: u32,
        /// Underlying error message.
        message: String,
    },

    /// The target collection does not exist and could not be created.
    #[error("collection {collection} unavailable: {message}")]
    CollectionUnavailable {
        /// Collection name.
        collection: String,
        /// Underlying error message.
        message: String,
    },

    /// The search call itself failed (distinct from a connection failure).
    #[error("search against {collection} failed: {message}")]
    SearchFailed {
        /// Collection name.
        collection: String,
        /// Underlying error message.
        message: String,
    },

    /// The query vector's dimension didn't match the collection's configured dimension.
    #[error("query vector dimension {actual} does not match collection dimension {expected}")]
    DimensionMismatch {
        /// Expected (collection) dimension.
        expected: u32,
        /// Actual (query) dimension.
        actual: usize,
    },

    /// The stage deadline elapsed before any candidates arrived.
    #[error("search against {collection} timed out before any candidates arrived")]
    Timeout {
        /// Collection name.
        collection: String,
    },
}
