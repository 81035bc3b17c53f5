//! Metrics collector: request/cache/error counters, per-stage latency
//! histograms, and rolling percentile snapshots for the introspection
//! endpoint.
//!
//! Counters and histograms are emitted through the `metrics` crate's facade
//! macros (`counter!`/`histogram!`) so any installed exporter (Prometheus,
//! statsd, ...) picks them up; the rolling-percentile snapshot used by
//! [`crate::pipeline::health`] is read back from an in-process
//! [`percentile::RollingWindow`] per stage, since the facade has no
//! standard read-back API.

pub mod percentile;


pub use percentile::Percentiles;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use self::percentile::RollingWindow;
use crate::cache::Namespace;

/// A pipeline stage tracked by the metrics collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The embedding gateway stage.
    Embed,
    /// The vector retriever stage.
    Retrieve,
    /// The feature assembler stage.
    Feature,
    /// The LTR scorer stage.
    Ltr,
    /// The fusion stage.
    Fusion,
    /// The whole pipeline, end to end.
    Pipeline,
}

impl Stage {
    /// All tracked stages, for iterating a full snapshot.
    pub const ALL: [Stage; 6] = [
        Stage::Embed,
        Stage::Retrieve,
        Stage::Feature,
        Stage::Ltr,
        Stage::Fusion,
        Stage::Pipeline,
    ];

    fn label(self) -> &'static str {
        match self {
            Stage::Embed => "embed",
            Stage::Retrieve => "retrieve",
            Stage::Feature => "feature",
            Stage::Ltr => "ltr",
            Stage::Fusion => "fusion",
            Stage::Pipeline => "pipeline",
        }
    }
}

impl Namespace {
    fn label(self) -> &'static str {
        match self {
            Namespace::Query => "query",
            Namespace::Feature => "feat",
            Namespace::Embed => "embed",
        }
    }
}

/// A structured snapshot of the collector's state, suitable for the health
/// and introspection endpoints.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Total requests handled since process start.
    pub requests_total: u64,
    /// Cache hits per namespace.
    pub cache_hits_total: HashMap<&'static str, u64>,
    /// Errors per error-kind label.
    pub errors_total: HashMap<String, u64>,
    /// Rolling p50/p95/p99 per stage.
    pub stage_percentiles: HashMap<&'static str, Percentiles>,
}

/// Collects counters, histograms, and rolling percentiles across requests.
///
/// Cheap to clone (wraps `Arc` handles); construct once at startup and share
/// across the orchestrator.
#[derive(Clone)]
pub struct MetricsCollector {
    requests_total: Arc<AtomicU64>,
    cache_hits: Arc<Mutex<HashMap<&'static str, u64>>>,
    errors: Arc<Mutex<HashMap<String, u64>>>,
    windows: Arc<HashMap<&'static str, RollingWindow>>,
}

impl MetricsCollector {
    const DEFAULT_WINDOW_CAPACITY: usize = 4_096;

    /// Builds a fresh collector with empty counters.
    pub fn new() -> Self {
        let mut windows = HashMap::new();
        for stage in Stage::ALL {
            windows.insert(stage.label(), RollingWindow::new(Self::DEFAULT_WINDOW_CAPACITY));
        }
        Self {
            requests_total: Arc::new(AtomicU64::new(0)),
            cache_hits: Arc::new(Mutex::new(HashMap::new())),
            errors: Arc::new(Mutex::new(HashMap::new())),
            windows: Arc::new(windows),
        }
    }

    /// Increments `requests_total`.
    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("requests_total").increment(1);
    }

    /// Increments `cache_hits_total{ns}`.
    pub fn record_cache_hit(&self, ns: Namespace) {
        let label = ns.label();
        *self.cache_hits.lock().entry(label).or_insert(0) += 1;
        metrics::counter!("cache_hits_total", "ns" => label).increment(1);
    }

    /// Increments `errors_total{kind}`.
    pub fn record_error(&self, kind: &str) {
        *self.errors.lock().entry(kind.to_string()).or_insert(0) += 1;
        metrics::counter!("errors_total", "kind" => kind.to_string()).increment(1);
    }

    /// Records a stage latency observation (`stage_latency_ms{stage}`),
    /// both to the facade histogram and to the stage's rolling window.
    pub fn record_stage_latency(&self, stage: Stage, millis: f64, now: i64) {
        metrics::histogram!("stage_latency_ms", "stage" => stage.label()).record(millis);
        if let Some(window) = self.windows.get(stage.label()) {
            window.record(now, millis);
        }
    }

    /// Returns a structured snapshot of all collected state as of `now`.
    pub fn snapshot(&self, now: i64) -> MetricsSnapshot {
        let stage_percentiles = Stage::ALL
            .iter()
            .map(|s| (s.label(), self.windows.get(s.label()).unwrap().snapshot(now)))
            .collect();

        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            cache_hits_total: self.cache_hits.lock().clone(),
            errors_total: self.errors.lock().clone(),
            stage_percentiles,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("requests_total", &self.requests_total.load(Ordering::Relaxed))
            .finish()
    }
}
