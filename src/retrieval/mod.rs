//! Vector retriever: ANN search against a vector store, returning
//! ordered [`Candidate`]s with their raw distances.
//!
//! Expressed as a trait so the pipeline can run against either the
//! production Qdrant-backed implementation ([`qdrant::QdrantVectorRetriever`])
//! or an in-memory [`mock::MockVectorRetriever`], the same pluggable-backend
//! idiom used by [`crate::embedding`] and, before it, the lineage's vector
//! store client.

pub mod error;
pub mod qdrant;

#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use error::RetrievalError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockVectorRetriever;
pub use qdrant::QdrantVectorRetriever;

use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::domain::Candidate;

/// Searches a vector store for candidates similar to a query vector.
///
/// Implementations must return candidates ordered by ascending distance
/// (closest first) and must never silently truncate below `limit` unless
/// the store itself has fewer eligible points — running out of candidates
/// is not an error.
pub trait VectorRetriever: Send + Sync {
    /// Searches `collection` for up to `limit` candidates nearest `query_vector`,
    /// optionally scoped to `tenant`.
    fn search(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
        tenant: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Candidate>, RetrievalError>> + Send;

    /// Like [`VectorRetriever::search`], but publishes candidates to `sink` as
    /// they are produced rather than only on completion.
    ///
    /// A caller racing this future against a deadline can read `sink` after a
    /// timeout to salvage whatever arrived before the cutoff (§4.5's partial-
    /// retrieval contract). The default implementation has no incremental
    /// delivery to offer — a single atomic vector-store RPC either returns
    /// everything or nothing — so it just forwards to [`VectorRetriever::search`]
    /// and fills `sink` once the call completes.
    fn search_partial(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
        tenant: Option<&str>,
        sink: Arc<Mutex<Vec<Candidate>>>,
    ) -> impl Future<Output = Result<Vec<Candidate>, RetrievalError>> + Send {
        async move {
            let candidates = self.search(collection, query_vector, limit, tenant).await?;
            *sink.lock().unwrap() = candidates.clone();
            Ok(candidates)
        }
    }
}
