use std::collections::HashMap;
use std::time::Duration;

use super::*;
use crate::cache::CacheLayer;

fn candidate(id: &str, distance: f64, token_count: Option<u32>) -> Candidate {
    Candidate {
        chunk_id: id.to_string(),
        document_id: format!("doc-{id}"),
        ordinal: 0,
        text: "the quick brown fox".to_string(),
        token_count,
        distance,
        provenance: "test".to_string(),
        metadata: HashMap::new(),
    }
}

fn fresh_cache() -> CacheLayer {
    CacheLayer::new(
        Duration::from_secs(60),
        Duration::from_secs(60),
        Duration::from_secs(60),
    )
}

#[test]
fn distance_scale_uses_max_when_fewer_than_five_candidates() {
    let candidates = vec![
        candidate("a", 0.1, Some(50)),
        candidate("b", 0.2, Some(100)),
        candidate("c", 0.3, Some(200)),
    ];
    let scale = distance_scale(&candidates);
    assert_eq!(scale, 0.3);
}

#[test]
fn distance_scale_is_one_for_empty_batch() {
    assert_eq!(distance_scale(&[]), 1.0);
}

#[test]
fn happy_path_worked_example_matches_spec_scenario_1() {
    let candidates = vec![
        candidate("a", 0.1, Some(50)),
        candidate("b", 0.2, Some(100)),
        candidate("c", 0.3, Some(200)),
    ];
    let cache = fresh_cache();
    let records = assemble(&candidates, &cache, 60, "v1");

    // distance_min=0.1, distance_scale=0.3 (max rule, <5 candidates):
    // similarity = 1 - (distance - 0.1) / 0.3.
    assert_eq!(records.len(), 3);
    assert!((records[0].similarity_primary - 1.0).abs() < 1e-9);
    assert!((records[1].similarity_primary - (2.0 / 3.0)).abs() < 1e-6);
    assert!((records[2].similarity_primary - (1.0 / 3.0)).abs() < 1e-6);
    assert!(records.iter().all(|r| r.bias == 1.0));
}

#[test]
fn log_length_falls_back_to_word_count_when_token_count_missing() {
    let candidates = vec![candidate("a", 0.1, None)];
    let cache = fresh_cache();
    let records = assemble(&candidates, &cache, 60, "v1");

    let expected = (4.0_f64 + 1.0).ln(); // "the quick brown fox" = 4 words
    assert!((records[0].log_length - expected).abs() < 1e-9);
}

#[test]
fn cache_hit_avoids_recompute_and_reuses_record() {
    let candidates = vec![candidate("a", 0.1, Some(50))];
    let cache = fresh_cache();

    let first = assemble(&candidates, &cache, 60, "v1");
    // Mutate distance to prove the second call reads from cache, not recompute.
    let mut mutated = candidates.clone();
    mutated[0].distance = 0.9;
    let second = assemble(&mutated, &cache, 60, "v1");

    assert_eq!(first[0].similarity_primary, second[0].similarity_primary);
}

#[test]
fn version_tag_mismatch_forces_recompute() {
    // Three candidates so distance_min/distance_scale stay fixed across both
    // calls (driven by "min"/"max") while "a"'s own distance moves, making
    // the recomputed similarity_primary for "a" observably different.
    let candidates = vec![
        candidate("min", 0.05, Some(10)),
        candidate("a", 0.3, Some(50)),
        candidate("max", 1.0, Some(10)),
    ];
    let cache = fresh_cache();

    let first = assemble(&candidates, &cache, 60, "v1");
    assert!((first[1].similarity_primary - 0.75).abs() < 1e-9);

    let mut mutated = candidates.clone();
    mutated[1].distance = 0.6;
    let second = assemble(&mutated, &cache, 60, "v2");

    assert!((second[1].similarity_primary - 0.45).abs() < 1e-9);
}

#[test]
fn order_is_preserved() {
    let candidates = vec![
        candidate("z", 0.5, Some(10)),
        candidate("a", 0.1, Some(10)),
    ];
    let cache = fresh_cache();
    let records = assemble(&candidates, &cache, 60, "v1");
    assert_eq!(records.len(), 2);
    // "a" (distance 0.1) is closer than "z" (distance 0.5), so it scores
    // higher, but stays at index 1 — the order matches the input, not score.
    assert!(records[1].similarity_primary > records[0].similarity_primary);
}
