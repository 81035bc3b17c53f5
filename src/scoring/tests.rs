use std::collections::HashMap;

use super::conceptual;
use super::ltr::{LinearModel, LtrStrategy};
use crate::domain::{Candidate, FeatureRecord, WeightSet};

fn candidate_with_metadata(metadata: HashMap<String, serde_json::Value>) -> Candidate {
    Candidate {
        chunk_id: "a".to_string(),
        document_id: "doc-a".to_string(),
        ordinal: 0,
        text: "text".to_string(),
        token_count: Some(10),
        distance: 0.1,
        provenance: "test".to_string(),
        metadata,
    }
}

fn feature(similarity: f64) -> FeatureRecord {
    FeatureRecord {
        schema_version: 1,
        similarity_primary: similarity,
        log_length: 1.0,
        bias: 1.0,
    }
}

fn weights() -> WeightSet {
    WeightSet {
        version: 1,
        ltr: 0.6,
        conceptual: 0.4,
        distance: 0.7,
        recency: 0.2,
        metadata: 0.1,
    }
}

#[test]
fn conceptual_score_with_no_recency_or_tags_is_distance_weight_times_similarity() {
    let candidates = vec![candidate_with_metadata(HashMap::new())];
    let features = vec![feature(1.0)];
    let scores = conceptual::score(&candidates, &features, &weights(), "query text", 0);

    // distance weight renormalized over 0.7+0.2+0.1=1.0 stays 0.7.
    assert!((scores[0] - 0.7).abs() < 1e-9);
}

#[test]
fn recency_component_decays_with_age() {
    let mut metadata = HashMap::new();
    metadata.insert("recency_ts".to_string(), serde_json::json!(0));
    let candidates = vec![candidate_with_metadata(metadata)];
    let features = vec![feature(0.0)];

    let now = 30 * 86_400; // exactly one decay constant (30 days) old
    let scores = conceptual::score(&candidates, &features, &weights(), "query", now);

    // recency_component = exp(-1) ≈ 0.3679; weight 0.2 renormalized stays 0.2.
    let expected = 0.2 * (-1.0_f64).exp();
    assert!((scores[0] - expected).abs() < 1e-6);
}

#[test]
fn missing_recency_contributes_zero() {
    let candidates = vec![candidate_with_metadata(HashMap::new())];
    let features = vec![feature(0.0)];
    let scores = conceptual::score(&candidates, &features, &weights(), "query", 1_000_000);
    assert_eq!(scores[0], 0.0);
}

#[test]
fn metadata_component_counts_matching_tags_capped_at_one() {
    let mut metadata = HashMap::new();
    metadata.insert(
        "topic_tags".to_string(),
        serde_json::json!(["rust", "async", "cache", "fusion", "scoring", "extra", "more", "more2", "more3", "more4", "more5"]),
    );
    let candidates = vec![candidate_with_metadata(metadata)];
    let features = vec![feature(0.0)];

    let scores = conceptual::score(
        &candidates,
        &features,
        &weights(),
        "rust async cache fusion scoring extra more more2 more3 more4 more5 more6",
        0,
    );

    // 11 matching tags * 0.1 = 1.1, capped at 1.0; weight 0.1 renormalized stays 0.1.
    assert!((scores[0] - 0.1).abs() < 1e-9);
}

#[test]
fn missing_tags_contribute_zero() {
    let candidates = vec![candidate_with_metadata(HashMap::new())];
    let features = vec![feature(0.0)];
    let scores = conceptual::score(&candidates, &features, &weights(), "rust async", 0);
    assert_eq!(scores[0], 0.0);
}

#[test]
fn linear_model_rejects_wrong_coefficient_count() {
    let result = LinearModel::from_coefficients(vec![1.0, 0.0], 1);
    assert!(result.is_err());
}

#[test]
fn linear_model_scores_as_dot_product() {
    let model = LinearModel::from_coefficients(vec![1.0, 0.0, 0.0], 1).unwrap();
    let strategy = LtrStrategy::Linear(model);
    let features = vec![feature(0.5), feature(0.25)];
    let scores = strategy.score(&features);
    assert_eq!(scores, vec![0.5, 0.25]);
}

#[test]
fn linear_model_from_artifact_parses_csv_coefficients() {
    let model = LinearModel::from_artifact("1.0, 0.0, 0.0", 1).unwrap();
    let strategy = LtrStrategy::Linear(model);
    assert_eq!(strategy.score(&[feature(0.3)]), vec![0.3]);
}

#[test]
fn linear_model_from_artifact_rejects_malformed_input() {
    let result = LinearModel::from_artifact("not,a,number", 1);
    assert!(result.is_err());
}
