//! # Retrieval & ranking core
//!
//! A hybrid retrieval-and-ranking pipeline: embed a query, search a vector
//! store for candidates, assemble engineered features, score those
//! candidates with both a learned linear model and a heuristic conceptual
//! blend, then fuse the two streams into a final ranking.
//!
//! ```text
//! Query → embed → retrieve → assemble features → {LTR, conceptual} → fuse → response
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use ragcore::config::Config;
//!
//! # fn run() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! config.validate()?;
//! println!("vector store: {}", config.vector_store_url);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Purpose |
//! |---------|---------|
//! | `mock` | In-memory embedding/retrieval backends for tests and demos |
//!
//! ## Modules
//!
//! - [`domain`] - Shared request/response data model
//! - [`config`] - Environment configuration and the model/weight registry
//! - [`cache`] - Namespaced query/feature/embedding cache
//! - [`metrics`] - Counters, histograms, and rolling percentiles
//! - [`embedding`] - Embedding gateway
//! - [`retrieval`] - Vector store retriever
//! - [`feature`] - Feature assembler
//! - [`scoring`] - Conceptual and LTR scorers
//! - [`fusion`] - Score-stream normalization and combination
//! - [`pipeline`] - Orchestrator and health/introspection
//! - [`hashing`] - Content-addressed hashing shared by cache and registry

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cache;
pub mod config;
pub mod constants;
pub mod domain;
pub mod embedding;
pub mod feature;
pub mod fusion;
pub mod hashing;
pub mod metrics;
pub mod pipeline;
pub mod retrieval;
pub mod scoring;

pub use cache::{CacheError, CacheLayer, Namespace};
pub use config::{Config, ConfigError, Registry, WeightSetInput};
pub use domain::{
    Candidate, CacheEntry, FeatureRecord, FusionWeightOverride, ModelEntry, ModelKind,
    ModelStatus, Query, ScoreComponents, ScoredCandidate, WeightSet,
};
pub use embedding::{EmbeddingError, EmbeddingGateway, HttpEmbeddingGateway};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbeddingGateway;
pub use metrics::{MetricsCollector, Percentiles};
pub use pipeline::{HealthReporter, HealthSnapshot, Orchestrator, PipelineError, QueryResponse};
pub use retrieval::{QdrantVectorRetriever, RetrievalError, VectorRetriever};
#[cfg(any(test, feature = "mock"))]
pub use retrieval::MockVectorRetriever;
pub use scoring::{LinearModel, LtrStrategy, ScoringError};
