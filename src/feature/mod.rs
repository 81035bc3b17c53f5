//! Feature assembler: turns retrieved candidates into schema-v1
//! [`FeatureRecord`]s, order-preserving, with per-candidate caching.

#[cfg(test)]
mod tests;

use std::time::Duration;

use crate::cache::{CacheLayer, Namespace};
use crate::constants::DISTANCE_SCALE_PERCENTILE_MIN_CANDIDATES;
use crate::domain::{Candidate, FeatureRecord, FEATURE_SCHEMA_V1};

/// Computes schema-v1 feature records for `candidates`, preserving order.
///
/// Reads `cache` under the `feat:*` namespace first; on a hit for a given
/// candidate id the cached record is reused instead of recomputed. Misses
/// are written back with `cache_ttl_secs` before returning.
pub fn assemble(
    candidates: &[Candidate],
    cache: &CacheLayer,
    cache_ttl_secs: u64,
    version_tag: &str,
) -> Vec<FeatureRecord> {
    let distance_min = distance_min(candidates);
    let distance_scale = distance_scale(candidates);
    let schema = FEATURE_SCHEMA_V1.to_string();

    candidates
        .iter()
        .map(|candidate| {
            let logical_id = format!("{}:{}", candidate.chunk_id, schema);

            if let Some(cached) = cache.get(Namespace::Feature, &logical_id, version_tag) {
                if let Ok(record) = decode_feature_record(&cached) {
                    return record;
                }
            }

            let record = compute_feature_record(candidate, distance_min, distance_scale);
            if let Ok(encoded) = encode_feature_record(&record) {
                cache.set(
                    Namespace::Feature,
                    &logical_id,
                    version_tag,
                    encoded,
                    Duration::from_secs(cache_ttl_secs),
                );
            }
            record
        })
        .collect()
}

/// The 95th-percentile distance across `candidates`, or the batch maximum
/// when fewer than [`DISTANCE_SCALE_PERCENTILE_MIN_CANDIDATES`] are present,
/// or `1.0` when the batch is empty.
fn distance_scale(candidates: &[Candidate]) -> f64 {
    if candidates.is_empty() {
        return 1.0;
    }

    let mut distances: Vec<f64> = candidates.iter().map(|c| c.distance).collect();
    distances.sort_by(|a, b| a.total_cmp(b));

    if distances.len() < DISTANCE_SCALE_PERCENTILE_MIN_CANDIDATES {
        return *distances.last().unwrap();
    }

    let rank = ((distances.len() - 1) as f64 * 0.95).round() as usize;
    distances[rank.min(distances.len() - 1)]
}

/// The smallest raw distance across `candidates`; unused (and never called)
/// when `candidates` is empty.
fn distance_min(candidates: &[Candidate]) -> f64 {
    candidates
        .iter()
        .map(|c| c.distance)
        .fold(f64::INFINITY, f64::min)
}

fn compute_feature_record(candidate: &Candidate, distance_min: f64, distance_scale: f64) -> FeatureRecord {
    let similarity_primary = if distance_scale > 0.0 {
        (1.0 - (candidate.distance - distance_min) / distance_scale).max(0.0)
    } else {
        0.0
    };

    let length_basis = candidate
        .token_count
        .map(|n| n as f64)
        .unwrap_or_else(|| candidate.text.split_whitespace().count() as f64);
    let log_length = (length_basis + 1.0).ln();

    FeatureRecord {
        schema_version: FEATURE_SCHEMA_V1,
        similarity_primary,
        log_length,
        bias: 1.0,
    }
}

fn encode_feature_record(record: &FeatureRecord) -> Result<Vec<u8>, serde_json::Error> {
    let wire = FeatureRecordWire {
        schema_version: record.schema_version,
        similarity_primary: record.similarity_primary,
        log_length: record.log_length,
        bias: record.bias,
    };
    serde_json::to_vec(&wire)
}

fn decode_feature_record(bytes: &[u8]) -> Result<FeatureRecord, serde_json::Error> {
    let wire: FeatureRecordWire = serde_json::from_slice(bytes)?;
    Ok(FeatureRecord {
        schema_version: wire.schema_version,
        similarity_primary: wire.similarity_primary,
        log_length: wire.log_length,
        bias: wire.bias,
    })
}

#[derive(serde::Serialize, serde::Deserialize)]
struct FeatureRecordWire {
    schema_version: u32,
    similarity_primary: f64,
    log_length: f64,
    bias: f64,
}
