//! Health & introspection: read-only snapshot of process state for
//! external probes. Never mutates anything.

use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::cache::CacheLayer;
use crate::config::Registry;
use crate::domain::ModelKind;
use crate::metrics::{MetricsCollector, Percentiles};

/// A read-only snapshot suitable for a health/introspection endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Active model identifiers (`"name@version"`), by kind label.
    pub active_models: HashMap<&'static str, String>,
    /// The active weight set's version.
    pub weight_set_version: u64,
    /// Whether the cache layer is reachable. The in-process cache is always
    /// available; this field exists for parity with a future out-of-process
    /// cache backend that could fail independently.
    pub cache_available: bool,
    /// Rolling p50/p95/p99 per stage.
    pub stage_percentiles: HashMap<&'static str, Percentiles>,
    /// Seconds since the orchestrator was constructed.
    pub uptime_secs: u64,
}

/// Builds [`HealthSnapshot`]s against a shared `started_at` instant.
pub struct HealthReporter {
    registry: Registry,
    cache: CacheLayer,
    metrics: MetricsCollector,
    started_at: Instant,
}

impl HealthReporter {
    /// Builds a reporter over the given handles. `started_at` should be
    /// captured once, at process/orchestrator construction time.
    pub fn new(registry: Registry, cache: CacheLayer, metrics: MetricsCollector, started_at: Instant) -> Self {
        Self {
            registry,
            cache,
            metrics,
            started_at,
        }
    }

    /// Produces a fresh snapshot as of `now` (Unix seconds, for the metrics
    /// rolling-window cutoff).
    pub fn snapshot(&self, now: i64) -> HealthSnapshot {
        let mut active_models = HashMap::new();
        for (kind, label) in [
            (ModelKind::Embedding, "embedding"),
            (ModelKind::Ltr, "ltr"),
            (ModelKind::Conceptual, "conceptual"),
        ] {
            if let Some(entry) = self.registry.get_active_model(kind) {
                active_models.insert(label, entry.identifier());
            }
        }

        let metrics_snapshot = self.metrics.snapshot(now);

        HealthSnapshot {
            active_models,
            weight_set_version: self.registry.get_active_weights().version,
            cache_available: true,
            stage_percentiles: metrics_snapshot.stage_percentiles,
            uptime_secs: self.started_at.elapsed().as_secs(),
        }
    }

    /// Exposed so a caller can confirm the cache layer is reachable without
    /// folding its return into the main snapshot's construction order.
    pub fn cache_entry_counts(&self) -> (u64, u64, u64) {
        use crate::cache::Namespace;
        (
            self.cache.len(Namespace::Query),
            self.cache.len(Namespace::Feature),
            self.cache.len(Namespace::Embed),
        )
    }
}
