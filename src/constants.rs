//! Cross-cutting, shared constants.
//!
//! Prefer deriving secondary constants (e.g. byte sizes) from primary ones to avoid drift.

/// Default embedding dimension, used when `EMBED_DIM` is unset.
pub const DEFAULT_EMBED_DIM: usize = 384;

/// Default `top_k` when a query omits one.
pub const DEFAULT_TOP_K: u32 = 10;

/// Lower bound for `top_k` (inclusive).
pub const MIN_TOP_K: u32 = 1;

/// Upper bound for `top_k` (inclusive).
pub const MAX_TOP_K: u32 = 100;

/// Multiplier applied to `top_k` to size the ANN request.
pub const DEFAULT_CANDIDATE_MULTIPLIER: u32 = 5;

/// Default upper bound on the ANN result set per request.
pub const DEFAULT_MAX_CANDIDATES: usize = 200;

/// Default per-request global pipeline deadline, in milliseconds.
pub const DEFAULT_PIPELINE_BUDGET_MS: u64 = 1500;

/// Default stage timeout for the embedding gateway, in milliseconds.
pub const DEFAULT_EMBED_TIMEOUT_MS: u64 = 300;

/// Default stage timeout for the vector retriever, in milliseconds.
pub const DEFAULT_RETRIEVAL_TIMEOUT_MS: u64 = 500;

/// Default stage timeout for the LTR scorer, in milliseconds.
pub const DEFAULT_LTR_TIMEOUT_MS: u64 = 200;

/// Default query-response cache TTL, in seconds.
pub const DEFAULT_CACHE_TTL_QUERY_S: u64 = 300;

/// Default feature-record cache TTL, in seconds.
pub const DEFAULT_CACHE_TTL_FEATURE_S: u64 = 600;

/// Default embedding cache TTL, in seconds. Embeddings are already keyed
/// by the active embedding model version, so a long default is safe (see
/// DESIGN.md).
pub const DEFAULT_CACHE_TTL_EMBED_S: u64 = 86_400;

/// Default maximum in-flight embedding gateway calls.
pub const DEFAULT_EMBED_MAX_INFLIGHT: usize = 16;

/// Default maximum in-flight vector retriever calls.
pub const DEFAULT_RETRIEVE_MAX_INFLIGHT: usize = 32;

/// Maximum accepted length (bytes) of a single text input to the embedding gateway.
pub const MAX_EMBED_INPUT_BYTES: usize = 8 * 1024;

/// Maximum accepted length (chars) of a query's user text.
pub const MAX_QUERY_CHARS: usize = 4096;

/// Minimum candidate count at or above which [`crate::feature`] computes a
/// true 95th-percentile `distance_scale`; below it, falls back to the batch
/// maximum.
pub const DISTANCE_SCALE_PERCENTILE_MIN_CANDIDATES: usize = 5;

/// Recency decay constant, in days. An assumed default; see DESIGN.md's
/// "Open Questions".
pub const RECENCY_DECAY_DAYS: f64 = 30.0;

/// Per matching tag contribution to the metadata component, before capping at 1.0.
pub const METADATA_TAG_WEIGHT: f64 = 0.1;

/// Initial reconnect backoff for the vector retriever, in milliseconds.
pub const RETRIEVAL_BACKOFF_INITIAL_MS: u64 = 50;

/// Backoff multiplier applied on each retry.
pub const RETRIEVAL_BACKOFF_FACTOR: u32 = 2;

/// Backoff cap, in milliseconds.
pub const RETRIEVAL_BACKOFF_CAP_MS: u64 = 1_000;

/// Maximum retrieval attempts per request (initial attempt + retries).
pub const RETRIEVAL_MAX_ATTEMPTS: u32 = 3;

/// Width of the metrics rolling-percentile window, in seconds.
pub const METRICS_WINDOW_SECS: i64 = 300;

/// Sentinel value written into `timings_ms` for a stage that did not run
/// (e.g. `embed`/`retrieve` on a query-cache hit).
pub const TIMING_SKIPPED_MS: i64 = 0;

/// Sentinel value written into `timings_ms` for a stage that degraded
/// (fell back) rather than completing normally.
pub const TIMING_DEGRADED_SENTINEL_MS: i64 = -1;
