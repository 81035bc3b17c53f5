//! Model and weight-set registry.
//!
//! Holds the process-wide active [`WeightSet`] and one active [`ModelEntry`]
//! per [`ModelKind`], published with copy-on-write semantics: a publish
//! swaps in a new `Arc` snapshot behind a `parking_lot::RwLock`, so in-flight
//! requests that already cloned the previous snapshot keep seeing it
//! consistently for the lifetime of their request.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use super::error::ConfigError;
use crate::domain::{ModelEntry, ModelKind, ModelStatus, WeightSet};

/// Unvalidated input to [`Registry::put_weights`]; the registry assigns the version.
#[derive(Debug, Clone, Copy)]
pub struct WeightSetInput {
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

impl WeightSetInput {
    /// Validates non-negativity and non-zero sums, then renormalizes both
    /// the `{ltr, conceptual}` pair and the `{distance, recency, metadata}`
    /// triple to sum to exactly 1.0 each.
    fn validate_and_renormalize(&self) -> Result<(f64, f64, f64, f64, f64), ConfigError> {
        let top = [self.ltr, self.conceptual];
        let sub = [self.distance, self.recency, self.metadata];

        for w in top.iter().chain(sub.iter()) {
            if *w < 0.0 || !w.is_finite() {
                return Err(ConfigError::InvalidWeightSet {
                    reason: format!("weights must be non-negative finite numbers, got {w}"),
                });
            }
        }

        let top_sum: f64 = top.iter().sum();
        if top_sum <= 0.0 {
            return Err(ConfigError::InvalidWeightSet {
                reason: "ltr + conceptual weights must sum to more than zero".to_string(),
            });
        }

        let sub_sum: f64 = sub.iter().sum();
        if sub_sum <= 0.0 {
            return Err(ConfigError::InvalidWeightSet {
                reason: "distance + recency + metadata weights must sum to more than zero"
                    .to_string(),
            });
        }

        Ok((
            self.ltr / top_sum,
            self.conceptual / top_sum,
            self.distance / sub_sum,
            self.recency / sub_sum,
            self.metadata / sub_sum,
        ))
    }
}

/// Process-wide registry of the active weight set and active models.
///
/// Cheap to clone (wraps `Arc` handles); intended to be constructed once at
/// startup and shared across the orchestrator and any control-plane callers.
#[derive(Clone)]
pub struct Registry {
    weights: Arc<RwLock<Arc<WeightSet>>>,
    models: Arc<RwLock<HashMap<ModelKind, Vec<ModelEntry>>>>,
}

impl Registry {
    /// Builds a registry seeded with an initial weight set (already
    /// validated and renormalized by the caller, typically from
    /// [`Config`](super::Config)).
    pub fn new(initial_weights: WeightSet) -> Self {
        Self {
            weights: Arc::new(RwLock::new(Arc::new(initial_weights))),
            models: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns an immutable snapshot of the currently active weight set.
    ///
    /// The orchestrator should call this once per request and hold the
    /// returned `Arc` for the request's duration (read-copy-update: a
    /// concurrent [`Registry::put_weights`] publishes a new snapshot without
    /// affecting requests already holding an older one).
    pub fn get_active_weights(&self) -> Arc<WeightSet> {
        Arc::clone(&self.weights.read())
    }

    /// Validates, renormalizes, and atomically publishes a new weight set,
    /// returning its assigned version. A failed validation leaves the
    /// active weights unchanged.
    pub fn put_weights(&self, candidate: WeightSetInput) -> Result<u64, ConfigError> {
        let (ltr, conceptual, distance, recency, metadata) =
            candidate.validate_and_renormalize()?;

        let mut guard = self.weights.write();
        let next_version = guard.version + 1;
        let published = WeightSet {
            version: next_version,
            ltr,
            conceptual,
            distance,
            recency,
            metadata,
        };
        info!(version = next_version, "publishing new weight set");
        *guard = Arc::new(published);
        Ok(next_version)
    }

    /// Returns the currently active model entry for `kind`, if one has been registered.
    pub fn get_active_model(&self, kind: ModelKind) -> Option<ModelEntry> {
        self.models
            .read()
            .get(&kind)
            .and_then(|entries| entries.iter().find(|e| e.status == ModelStatus::Active))
            .cloned()
    }

    /// Returns all non-archived entries of `kind`, most recent first, for audit/introspection.
    pub fn list_models(&self, kind: ModelKind) -> Vec<ModelEntry> {
        let mut entries: Vec<ModelEntry> = self
            .models
            .read()
            .get(&kind)
            .map(|v| {
                v.iter()
                    .filter(|e| e.status != ModelStatus::Archived)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| b.version.cmp(&a.version));
        entries
    }

    /// Registers `entry`. If `entry.status` is [`ModelStatus::Active`], the
    /// previously active entry of the same kind (if any) is atomically
    /// retired to [`ModelStatus::Deprecated`].
    pub fn register_model(&self, entry: ModelEntry) -> Result<(), ConfigError> {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::InvalidModelEntry {
                name: entry.name,
                reason: "name must not be empty".to_string(),
            });
        }
        if entry.kind == ModelKind::Embedding && entry.dimension.is_none() {
            return Err(ConfigError::InvalidModelEntry {
                name: entry.name,
                reason: "embedding model entries require a dimension".to_string(),
            });
        }

        let mut guard = self.models.write();
        let bucket = guard.entry(entry.kind).or_default();

        if entry.status == ModelStatus::Active {
            for existing in bucket.iter_mut() {
                if existing.status == ModelStatus::Active {
                    warn!(
                        name = %existing.name,
                        version = existing.version,
                        "retiring active model entry"
                    );
                    existing.status = ModelStatus::Deprecated;
                }
            }
        }

        bucket.push(entry);
        Ok(())
    }

    /// Moves every `Deprecated` entry of `kind` older than `keep_versions`
    /// most-recent deprecations to `Archived`. Archived entries stay stored
    /// (for audit by external tooling) but are no longer returned by
    /// [`Registry::list_models`].
    pub fn archive_old_deprecations(&self, kind: ModelKind, keep_versions: usize) {
        let mut guard = self.models.write();
        let Some(bucket) = guard.get_mut(&kind) else {
            return;
        };

        let mut deprecated_versions: Vec<u64> = bucket
            .iter()
            .filter(|e| e.status == ModelStatus::Deprecated)
            .map(|e| e.version)
            .collect();
        deprecated_versions.sort_unstable_by(|a, b| b.cmp(a));
        let keep: std::collections::HashSet<u64> = deprecated_versions
            .into_iter()
            .take(keep_versions)
            .collect();

        for entry in bucket.iter_mut() {
            if entry.status == ModelStatus::Deprecated && !keep.contains(&entry.version) {
                entry.status = ModelStatus::Archived;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_weights() -> WeightSet {
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
    fn put_weights_renormalizes_and_increments_version() {
        let registry = Registry::new(base_weights());
        let version = registry
            .put_weights(WeightSetInput {
                ltr: 2.0,
                conceptual: 2.0,
                distance: 1.0,
                recency: 1.0,
                metadata: 2.0,
            })
            .unwrap();
        assert_eq!(version, 2);

        let active = registry.get_active_weights();
        assert_eq!(active.version, 2);
        assert!((active.ltr - 0.5).abs() < 1e-9);
        assert!((active.conceptual - 0.5).abs() < 1e-9);
        assert!((active.distance + active.recency + active.metadata - 1.0).abs() < 1e-9);
    }

    #[test]
    fn put_weights_rejects_zero_sum_and_leaves_active_unchanged() {
        let registry = Registry::new(base_weights());
        let err = registry.put_weights(WeightSetInput {
            ltr: 0.0,
            conceptual: 0.0,
            distance: 1.0,
            recency: 1.0,
            metadata: 1.0,
        });
        assert!(err.is_err());
        assert_eq!(registry.get_active_weights().version, 1);
    }

    #[test]
    fn put_weights_rejects_negative_weight() {
        let registry = Registry::new(base_weights());
        let err = registry.put_weights(WeightSetInput {
            ltr: -0.5,
            conceptual: 1.0,
            distance: 1.0,
            recency: 1.0,
            metadata: 1.0,
        });
        assert!(err.is_err());
    }

    #[test]
    fn version_is_monotonic_across_puts() {
        let registry = Registry::new(base_weights());
        let v2 = registry
            .put_weights(WeightSetInput {
                ltr: 1.0,
                conceptual: 1.0,
                distance: 1.0,
                recency: 1.0,
                metadata: 1.0,
            })
            .unwrap();
        let v3 = registry
            .put_weights(WeightSetInput {
                ltr: 3.0,
                conceptual: 1.0,
                distance: 1.0,
                recency: 1.0,
                metadata: 1.0,
            })
            .unwrap();
        assert!(v3 > v2);
    }

    #[test]
    fn register_model_retires_previous_active_to_deprecated() {
        let registry = Registry::new(base_weights());
        let v1 = ModelEntry {
            name: "minilm".to_string(),
            kind: ModelKind::Embedding,
            version: 1,
            dimension: Some(384),
            artifact: "minilm@1".to_string(),
            status: ModelStatus::Active,
        };
        registry.register_model(v1).unwrap();

        let v2 = ModelEntry {
            name: "minilm".to_string(),
            kind: ModelKind::Embedding,
            version: 2,
            dimension: Some(384),
            artifact: "minilm@2".to_string(),
            status: ModelStatus::Active,
        };
        registry.register_model(v2).unwrap();

        let active = registry.get_active_model(ModelKind::Embedding).unwrap();
        assert_eq!(active.version, 2);

        let listed = registry.list_models(ModelKind::Embedding);
        assert_eq!(listed.len(), 2);
        let deprecated = listed.iter().find(|e| e.version == 1).unwrap();
        assert_eq!(deprecated.status, ModelStatus::Deprecated);
    }

    #[test]
    fn embedding_model_without_dimension_is_rejected() {
        let registry = Registry::new(base_weights());
        let entry = ModelEntry {
            name: "minilm".to_string(),
            kind: ModelKind::Embedding,
            version: 1,
            dimension: None,
            artifact: "minilm@1".to_string(),
            status: ModelStatus::Active,
        };
        assert!(registry.register_model(entry).is_err());
    }

    #[test]
    fn archive_old_deprecations_keeps_only_recent() {
        let registry = Registry::new(base_weights());
        for v in 1..=4u64 {
            registry
                .register_model(ModelEntry {
                    name: "linear".to_string(),
                    kind: ModelKind::Ltr,
                    version: v,
                    dimension: None,
                    artifact: format!("linear@{v}"),
                    status: ModelStatus::Active,
                })
                .unwrap();
        }
        registry.archive_old_deprecations(ModelKind::Ltr, 1);
        let listed = registry.list_models(ModelKind::Ltr);
        // v4 active, v3 deprecated (kept), v1/v2 archived (filtered out of listing).
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|e| e.version == 4));
        assert!(listed.iter().any(|e| e.version == 3));
    }
}
