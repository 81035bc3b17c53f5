//! Conceptual scorer: a pure, deterministic heuristic blend of
//! similarity, recency, and metadata overlap. Contains no I/O.

use std::collections::HashSet;

use crate::constants::{METADATA_TAG_WEIGHT, RECENCY_DECAY_DAYS};
use crate::domain::{Candidate, FeatureRecord, WeightSet};

/// Scores `candidates` against their `features`, using the conceptual
/// sub-weights of `weights` (renormalized to sum to 1) and the query's
/// extracted keyword set for metadata overlap.
///
/// `now_unix` is passed in rather than read from the clock so recency
/// scoring is deterministic under test.
pub fn score(
    candidates: &[Candidate],
    features: &[FeatureRecord],
    weights: &WeightSet,
    query_text: &str,
    now_unix: i64,
) -> Vec<f64> {
    let (w_distance, w_recency, w_metadata) = renormalized_sub_weights(weights);
    let query_tags = extract_keywords(query_text);

    candidates
        .iter()
        .zip(features)
        .map(|(candidate, feature)| {
            let recency = recency_component(candidate, now_unix);
            let metadata = metadata_component(candidate, &query_tags);
            w_distance * feature.similarity_primary + w_recency * recency + w_metadata * metadata
        })
        .collect()
}

fn renormalized_sub_weights(weights: &WeightSet) -> (f64, f64, f64) {
    let sum = weights.distance + weights.recency + weights.metadata;
    if sum <= 0.0 {
        // A validated WeightSet (see config::registry) never reaches here
        // with a non-positive sum; this is a last-resort neutral fallback.
        return (1.0, 0.0, 0.0);
    }
    (
        weights.distance / sum,
        weights.recency / sum,
        weights.metadata / sum,
    )
}

/// `exp(-age_days / RECENCY_DECAY_DAYS)`, clamped to `[0, 1]`; `0` when
/// `recency_ts` is absent or unparsable.
fn recency_component(candidate: &Candidate, now_unix: i64) -> f64 {
    let Some(recency_ts) = candidate
        .metadata
        .get("recency_ts")
        .and_then(|v| v.as_i64())
    else {
        return 0.0;
    };

    let age_days = (now_unix - recency_ts).max(0) as f64 / 86_400.0;
    (-age_days / RECENCY_DECAY_DAYS).exp().clamp(0.0, 1.0)
}

/// `0.1` per matching tag between the query's whitespace-tokenized, lowercased
/// keywords and the candidate's `topic_tags`, capped at `1.0`; `0` when
/// `topic_tags` is absent.
fn metadata_component(candidate: &Candidate, query_tags: &HashSet<String>) -> f64 {
    let Some(tags) = candidate.metadata.get("topic_tags").and_then(|v| v.as_array()) else {
        return 0.0;
    };

    let matches = tags
        .iter()
        .filter_map(|t| t.as_str())
        .filter(|t| query_tags.contains(&t.to_lowercase()))
        .count();

    (matches as f64 * METADATA_TAG_WEIGHT).min(1.0)
}

fn extract_keywords(query_text: &str) -> HashSet<String> {
    query_text
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect()
}
