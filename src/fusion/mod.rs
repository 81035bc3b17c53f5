//! Fusion engine: normalize the two score streams, combine them with
//! the active top-level weights, and produce a final ordering.


use crate::domain::{Candidate, ScoreComponents, ScoredCandidate, WeightSet};

/// Fuses `ltr_scores` and `conceptual_scores` for `candidates` (all three
/// must be the same length and in the same order) into sorted
/// [`ScoredCandidate`]s.
///
/// Empty input returns an empty output, never an error.
pub fn fuse(
    candidates: &[Candidate],
    features: &[crate::domain::FeatureRecord],
    ltr_scores: &[f64],
    conceptual_scores: &[f64],
    weights: &WeightSet,
) -> Vec<ScoredCandidate> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let ltr_norm = min_max_normalize(ltr_scores);
    let conceptual_norm = min_max_normalize(conceptual_scores);
    let (w_ltr, w_conceptual) = renormalized_top_level_weights(weights);

    let mut scored: Vec<ScoredCandidate> = candidates
        .iter()
        .zip(features)
        .enumerate()
        .map(|(i, (candidate, feature))| {
            let fused_score = w_ltr * ltr_norm[i] + w_conceptual * conceptual_norm[i];
            ScoredCandidate {
                candidate: candidate.clone(),
                features: feature.clone(),
                ltr_score: ltr_scores[i],
                conceptual_score: conceptual_scores[i],
                fused_score,
                components: ScoreComponents {
                    raw_ltr: ltr_scores[i],
                    raw_conceptual: conceptual_scores[i],
                    normalized_ltr: ltr_norm[i],
                    normalized_conceptual: conceptual_norm[i],
                },
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.fused_score
            .total_cmp(&a.fused_score)
            .then_with(|| b.features.similarity_primary.total_cmp(&a.features.similarity_primary))
            .then_with(|| a.candidate.chunk_id.cmp(&b.candidate.chunk_id))
    });

    scored
}

/// Min-max normalizes `scores` to `[0, 1]`. A zero-range stream (all values
/// equal, including a single-element stream) maps every element to the
/// neutral value `0.5`.
fn min_max_normalize(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }

    let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range == 0.0 {
        return vec![0.5; scores.len()];
    }

    scores.iter().map(|s| (s - min) / range).collect()
}

fn renormalized_top_level_weights(weights: &WeightSet) -> (f64, f64) {
    let sum = weights.ltr + weights.conceptual;
    if sum <= 0.0 {
        return (0.5, 0.5);
    }
    (weights.ltr / sum, weights.conceptual / sum)
}
