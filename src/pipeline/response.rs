//! Serde-serializable response shapes for the query API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::ScoredCandidate;

/// The full response returned from [`super::Orchestrator::query`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Ranked results, truncated to the request's `top_k`.
    pub results: Vec<ResultItem>,
    /// The top-level fusion weights used for this request, with their version.
    pub weights: WeightsInfo,
    /// Identifiers of the active models used for this request.
    pub models: ModelsInfo,
    /// Per-stage latency in milliseconds.
    pub timings_ms: TimingsMs,
    /// `true` if this response was served from the query-response cache.
    pub cache: bool,
    /// `true` if any stage fell back to a non-fatal degraded path.
    pub degraded: bool,
    /// Composite cache version tag this response was computed/stored under.
    pub version_tag: String,
}

/// One ranked result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    /// The source chunk's identifier.
    pub chunk_id: String,
    /// The chunk's text.
    pub text: String,
    /// Final fused score in `[0, 1]`.
    pub fused_score: f64,
    /// Raw/normalized score breakdown.
    pub components: ComponentsView,
    /// Passthrough candidate metadata.
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Score breakdown for one result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentsView {
    /// Raw (pre-normalization) scores.
    pub raw: StreamPair,
    /// Min-max normalized scores.
    pub normalized: StreamPair,
    /// The candidate's raw ANN distance.
    pub distance: f64,
}

/// An LTR/conceptual pair, used for both raw and normalized components.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StreamPair {
    /// LTR stream value.
    pub ltr: f64,
    /// Conceptual stream value.
    pub conceptual: f64,
}

/// The weights used for this request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightsInfo {
    /// Top-level LTR weight.
    pub ltr: f64,
    /// Top-level conceptual weight.
    pub conceptual: f64,
    /// The weight set's version.
    pub version: u64,
}

/// Active model identifiers used for this request, `"name@version"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsInfo {
    /// Embedding model identifier.
    pub embedding: String,
    /// LTR model identifier.
    pub ltr: String,
}

/// Per-stage latency, milliseconds. A stage that did not run (e.g. on a
/// cache hit) carries [`crate::constants::TIMING_SKIPPED_MS`]; a stage that
/// degraded carries [`crate::constants::TIMING_DEGRADED_SENTINEL_MS`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimingsMs {
    /// Embedding gateway stage latency.
    pub embed: i64,
    /// Vector retriever stage latency.
    pub retrieve: i64,
    /// Feature assembler stage latency.
    pub feature: i64,
    /// LTR scorer stage latency.
    pub ltr: i64,
    /// Fusion stage latency.
    pub fusion: i64,
    /// Total end-to-end latency.
    pub total: i64,
}

impl QueryResponse {
    /// Builds the result list from sorted, fused candidates, truncated to `top_k`.
    pub fn results_from_scored(scored: &[ScoredCandidate], top_k: u32) -> Vec<ResultItem> {
        scored
            .iter()
            .take(top_k as usize)
            .map(|s| ResultItem {
                chunk_id: s.candidate.chunk_id.clone(),
                text: s.candidate.text.clone(),
                fused_score: s.fused_score,
                components: ComponentsView {
                    raw: StreamPair {
                        ltr: s.components.raw_ltr,
                        conceptual: s.components.raw_conceptual,
                    },
                    normalized: StreamPair {
                        ltr: s.components.normalized_ltr,
                        conceptual: s.components.normalized_conceptual,
                    },
                    distance: s.candidate.distance,
                },
                metadata: s.candidate.metadata.clone(),
            })
            .collect()
    }
}
