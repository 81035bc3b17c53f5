//! Shared data model for the retrieval and ranking core.
//!
//! These types are the transient per-request objects the pipeline passes
//! between stages ([`Chunk`], [`Query`], [`Candidate`], [`FeatureRecord`],
//! [`ScoredCandidate`]) plus the two registry-owned types ([`WeightSet`],
//! [`ModelEntry`]) and the cache envelope ([`CacheEntry`]). The core never
//! mutates a [`Chunk`]; it is read-only provenance for a candidate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Feature schema version currently implemented.
pub const FEATURE_SCHEMA_V1: u32 = 1;

/// The atomic retrieval unit. Owned and mutated externally; the core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier, unique within a tenant.
    pub id: String,
    /// Identifier of the owning document.
    pub document_id: String,
    /// Ordinal position of this chunk within its document.
    pub ordinal: u32,
    /// The chunk's text content.
    pub text: String,
    /// Token count, when known upstream.
    pub token_count: Option<u32>,
    /// Content checksum, opaque to the core.
    pub checksum: Option<String>,
    /// Primary (small) embedding, if already computed upstream.
    pub embedding_primary: Option<Vec<f32>>,
    /// Optional secondary dense embedding column.
    ///
    /// The core assumes a single active embedding dimension per process (see
    /// DESIGN.md); this field is carried through for provenance but never
    /// read by the scoring stages.
    pub embedding_dense: Option<Vec<f32>>,
    /// Free-form metadata. Conventional keys: `recency_ts`, `authority`, `topic_tags`.
    pub metadata: HashMap<String, serde_json::Value>,
    /// Whether the chunk is eligible for retrieval.
    pub active: bool,
    /// Owning tenant, when tenancy is in use.
    pub tenant_id: Option<String>,
}

/// A request to the pipeline orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Raw user text, 1..4096 chars.
    pub text: String,
    /// Requested result count, bounded 1..100; `None` uses `RAG_TOP_K_DEFAULT`.
    pub top_k: Option<u32>,
    /// Optional tenant scope.
    pub tenant: Option<String>,
    /// Skip the query-response cache lookup/store for this request.
    #[serde(default)]
    pub bypass_cache: bool,
    /// Explicit override of the top-level fusion weights for this request only.
    pub fusion_weights_override: Option<FusionWeightOverride>,
}

/// Per-request override of the two top-level fusion weights.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FusionWeightOverride {
    /// Override for the LTR stream weight.
    pub ltr: f64,
    /// Override for the conceptual stream weight.
    pub conceptual: f64,
}

/// A chunk selected by the retriever as potentially relevant, with its raw distance.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Reference to the source chunk's identifier.
    pub chunk_id: String,
    /// Owning document identifier, passed through from the vector store.
    pub document_id: String,
    /// Ordinal within the document.
    pub ordinal: u32,
    /// Chunk text, passed through for response assembly.
    pub text: String,
    /// Token count, when the vector store reports one.
    pub token_count: Option<u32>,
    /// Raw ANN distance, verbatim from the vector store (never normalized here).
    pub distance: f64,
    /// Opaque provenance tag (e.g. which shard or index served the candidate).
    pub provenance: String,
    /// Passthrough metadata for recency/metadata scoring and response assembly.
    pub metadata: HashMap<String, serde_json::Value>,
}

/// An ordered numeric feature vector for one candidate, matching the active schema.
#[derive(Debug, Clone)]
pub struct FeatureRecord {
    /// Schema version this record was computed under.
    pub schema_version: u32,
    /// `1 - normalized distance`.
    pub similarity_primary: f64,
    /// `ln(token_count + 1)` (or word-count fallback).
    pub log_length: f64,
    /// Constant bias term, always `1.0`.
    pub bias: f64,
}

impl FeatureRecord {
    /// Returns the v1 feature vector in schema order:
    /// `[similarity_primary, log_length, bias]`.
    pub fn as_v1_vector(&self) -> [f64; 3] {
        [self.similarity_primary, self.log_length, self.bias]
    }
}

/// Breakdown of one candidate's raw and normalized score components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreComponents {
    /// Raw (pre-normalization) LTR score.
    pub raw_ltr: f64,
    /// Raw (pre-normalization) conceptual score.
    pub raw_conceptual: f64,
    /// Min-max normalized LTR score, in `[0, 1]`.
    pub normalized_ltr: f64,
    /// Min-max normalized conceptual score, in `[0, 1]`.
    pub normalized_conceptual: f64,
}

/// A candidate after scoring and fusion.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    /// The underlying candidate.
    pub candidate: Candidate,
    /// The feature record the candidate was scored from.
    pub features: FeatureRecord,
    /// Raw LTR score before normalization.
    pub ltr_score: f64,
    /// Raw conceptual score before normalization.
    pub conceptual_score: f64,
    /// Fused score in `[0, 1]` after normalization and weighted combination.
    pub fused_score: f64,
    /// Full raw/normalized component breakdown.
    pub components: ScoreComponents,
}

/// Named, versioned mapping from score-component name to non-negative weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightSet {
    /// Monotonically increasing version, assigned by the registry on publish.
    pub version: u64,
    /// Top-level fusion weight for the LTR stream.
    pub ltr: f64,
    /// Top-level fusion weight for the conceptual stream.
    pub conceptual: f64,
    /// Conceptual sub-weight: distance component.
    pub distance: f64,
    /// Conceptual sub-weight: recency component.
    pub recency: f64,
    /// Conceptual sub-weight: metadata component.
    pub metadata: f64,
}

/// The kind of model a [`ModelEntry`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// The embedding model used by the gateway.
    Embedding,
    /// The learning-to-rank model used by the LTR scorer.
    Ltr,
    /// The conceptual scorer's (nominal) model — conceptual scoring has no
    /// trained artifact today, but the registry still tracks one entry of
    /// this kind so health/introspection can report it symmetrically.
    Conceptual,
}

/// Lifecycle status of a [`ModelEntry`]. See DESIGN.md for the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    /// Registered but not yet promoted; not selected for scoring.
    Experimental,
    /// The single entry of its kind selected for scoring.
    Active,
    /// Retired by a newer active entry; still readable for audit.
    Deprecated,
    /// Terminal status; no longer enumerated by normal listings.
    Archived,
}

/// A versioned model or weight-set artifact tracked by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Human-readable name, stable across versions.
    pub name: String,
    /// What kind of model this entry represents.
    pub kind: ModelKind,
    /// Monotonically increasing version for this name.
    pub version: u64,
    /// Vector dimension, meaningful only for `ModelKind::Embedding`.
    pub dimension: Option<u32>,
    /// Opaque pointer to the model artifact (path, URI, or inline coefficients tag).
    pub artifact: String,
    /// Current lifecycle status.
    pub status: ModelStatus,
}

impl ModelEntry {
    /// Returns `"name@version"`, the identifier format used in responses.
    pub fn identifier(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// Cache envelope: payload plus freshness bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Raw payload bytes (JSON or binary, depending on namespace codec).
    pub payload: Vec<u8>,
    /// Unix timestamp (seconds) the entry was created.
    pub created_at: i64,
    /// Time-to-live in seconds from `created_at`.
    pub ttl_secs: u64,
    /// Version tag the entry was stored under; a mismatch at lookup is a miss.
    pub version_tag: String,
}

impl CacheEntry {
    /// Returns `true` if the entry's `created_at + ttl_secs` is in the past relative to `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.created_at + self.ttl_secs as i64
    }
}
