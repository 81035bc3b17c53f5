//! Environment configuration and the model/weight registry.

pub mod error;
pub mod registry;

#[cfg(test)]
mod tests;

pub use error::ConfigError;
pub use registry::{Registry, WeightSetInput};

use std::env;

use crate::constants::{
    DEFAULT_CACHE_TTL_FEATURE_S, DEFAULT_CACHE_TTL_QUERY_S, DEFAULT_CANDIDATE_MULTIPLIER,
    DEFAULT_EMBED_DIM, DEFAULT_EMBED_MAX_INFLIGHT, DEFAULT_EMBED_TIMEOUT_MS,
    DEFAULT_LTR_TIMEOUT_MS, DEFAULT_MAX_CANDIDATES, DEFAULT_PIPELINE_BUDGET_MS,
    DEFAULT_RETRIEVAL_TIMEOUT_MS, DEFAULT_RETRIEVE_MAX_INFLIGHT, DEFAULT_TOP_K,
};
use crate::domain::WeightSet;

/// Environment-backed configuration for the retrieval and ranking core.
///
/// Loaded once at process startup via [`Config::from_env`]. Each field has
/// a documented default so the core can start in a degraded-but-functional
/// mode without a fully populated environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the external embedding HTTP service.
    pub embed_endpoint: String,
    /// Expected embedding vector dimension; mismatches fail fast.
    pub embed_dim: u32,
    /// If true, embedding failures fall back to a zero vector and mark the response degraded.
    pub allow_embed_fallback: bool,
    /// Default `top_k` when a query omits one.
    pub top_k_default: u32,
    /// Initial top-level fusion weight for the LTR stream.
    pub fusion_ltr_weight: f64,
    /// Initial top-level fusion weight for the conceptual stream.
    pub fusion_conceptual_weight: f64,
    /// Initial conceptual sub-weight: distance.
    pub weight_distance: f64,
    /// Initial conceptual sub-weight: recency.
    pub weight_recency: f64,
    /// Initial conceptual sub-weight: metadata.
    pub weight_metadata: f64,
    /// Query-response cache TTL, in seconds.
    pub cache_ttl_query_s: u64,
    /// Feature-record cache TTL, in seconds.
    pub cache_ttl_feature_s: u64,
    /// Vector retriever stage timeout, in milliseconds.
    pub retrieval_timeout_ms: u64,
    /// Embedding gateway stage timeout, in milliseconds.
    pub embed_timeout_ms: u64,
    /// LTR scorer stage timeout, in milliseconds.
    pub ltr_timeout_ms: u64,
    /// Upper bound on the ANN result set size per request.
    pub max_candidates: usize,
    /// Multiplier applied to `top_k` to size the ANN request.
    pub candidate_multiplier: u32,
    /// Global per-request pipeline deadline, in milliseconds.
    pub pipeline_budget_ms: u64,
    /// Whether queries must carry a tenant scope.
    pub tenant_required: bool,
    /// Maximum in-flight embedding gateway calls.
    pub embed_max_inflight: usize,
    /// Maximum in-flight vector retriever calls.
    pub retrieve_max_inflight: usize,
    /// Qdrant (or compatible) vector store URL.
    pub vector_store_url: String,
    /// Bind address, retained for parity with the lineage's `Config` shape
    /// and the demo binary's introspection banner; the core itself never binds a socket.
    pub bind_addr: String,
    /// Port, retained for the same reason as `bind_addr`.
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embed_endpoint: "http://localhost:9000/embed".to_string(),
            embed_dim: DEFAULT_EMBED_DIM as u32,
            allow_embed_fallback: false,
            top_k_default: DEFAULT_TOP_K,
            fusion_ltr_weight: 0.6,
            fusion_conceptual_weight: 0.4,
            weight_distance: 0.7,
            weight_recency: 0.2,
            weight_metadata: 0.1,
            cache_ttl_query_s: DEFAULT_CACHE_TTL_QUERY_S,
            cache_ttl_feature_s: DEFAULT_CACHE_TTL_FEATURE_S,
            retrieval_timeout_ms: DEFAULT_RETRIEVAL_TIMEOUT_MS,
            embed_timeout_ms: DEFAULT_EMBED_TIMEOUT_MS,
            ltr_timeout_ms: DEFAULT_LTR_TIMEOUT_MS,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            candidate_multiplier: DEFAULT_CANDIDATE_MULTIPLIER,
            pipeline_budget_ms: DEFAULT_PIPELINE_BUDGET_MS,
            tenant_required: false,
            embed_max_inflight: DEFAULT_EMBED_MAX_INFLIGHT,
            retrieve_max_inflight: DEFAULT_RETRIEVE_MAX_INFLIGHT,
            vector_store_url: "http://localhost:6334".to_string(),
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    const ENV_EMBED_ENDPOINT: &'static str = "EMBED_ENDPOINT";
    const ENV_EMBED_DIM: &'static str = "EMBED_DIM";
    const ENV_ALLOW_EMBED_FALLBACK: &'static str = "ALLOW_EMBED_FALLBACK";
    const ENV_TOP_K_DEFAULT: &'static str = "RAG_TOP_K_DEFAULT";
    const ENV_FUSION_LTR_WEIGHT: &'static str = "RAG_FUSION_LTR_WEIGHT";
    const ENV_FUSION_CONCEPTUAL_WEIGHT: &'static str = "RAG_FUSION_CONCEPTUAL_WEIGHT";
    const ENV_WEIGHT_DISTANCE: &'static str = "RAG_WEIGHT_DISTANCE";
    const ENV_WEIGHT_RECENCY: &'static str = "RAG_WEIGHT_RECENCY";
    const ENV_WEIGHT_METADATA: &'static str = "RAG_WEIGHT_METADATA";
    const ENV_CACHE_TTL_QUERY_S: &'static str = "CACHE_TTL_QUERY_S";
    const ENV_CACHE_TTL_FEATURE_S: &'static str = "CACHE_TTL_FEATURE_S";
    const ENV_RETRIEVAL_TIMEOUT_MS: &'static str = "RETRIEVAL_TIMEOUT_MS";
    const ENV_EMBED_TIMEOUT_MS: &'static str = "EMBED_TIMEOUT_MS";
    const ENV_LTR_TIMEOUT_MS: &'static str = "LTR_TIMEOUT_MS";
    const ENV_MAX_CANDIDATES: &'static str = "MAX_CANDIDATES";
    const ENV_CANDIDATE_MULTIPLIER: &'static str = "RAG_CANDIDATE_MULTIPLIER";
    const ENV_PIPELINE_BUDGET_MS: &'static str = "RAG_PIPELINE_BUDGET_MS";
    const ENV_TENANT_REQUIRED: &'static str = "TENANT_REQUIRED";
    const ENV_EMBED_MAX_INFLIGHT: &'static str = "EMBED_MAX_INFLIGHT";
    const ENV_RETRIEVE_MAX_INFLIGHT: &'static str = "RETRIEVE_MAX_INFLIGHT";
    const ENV_VECTOR_STORE_URL: &'static str = "VECTOR_STORE_URL";
    const ENV_BIND_ADDR: &'static str = "BIND_ADDR";
    const ENV_PORT: &'static str = "PORT";

    /// Loads configuration from the process environment, falling back to
    /// defaults for anything unset. Fails with [`ConfigError`] if a set
    /// variable cannot be parsed as its expected type.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            embed_endpoint: Self::string_from_env(
                Self::ENV_EMBED_ENDPOINT,
                defaults.embed_endpoint,
            ),
            embed_dim: Self::parse_from_env(Self::ENV_EMBED_DIM, defaults.embed_dim, "u32")?,
            allow_embed_fallback: Self::parse_from_env(
                Self::ENV_ALLOW_EMBED_FALLBACK,
                defaults.allow_embed_fallback,
                "bool",
            )?,
            top_k_default: Self::parse_from_env(
                Self::ENV_TOP_K_DEFAULT,
                defaults.top_k_default,
                "u32",
            )?,
            fusion_ltr_weight: Self::parse_from_env(
                Self::ENV_FUSION_LTR_WEIGHT,
                defaults.fusion_ltr_weight,
                "f64",
            )?,
            fusion_conceptual_weight: Self::parse_from_env(
                Self::ENV_FUSION_CONCEPTUAL_WEIGHT,
                defaults.fusion_conceptual_weight,
                "f64",
            )?,
            weight_distance: Self::parse_from_env(
                Self::ENV_WEIGHT_DISTANCE,
                defaults.weight_distance,
                "f64",
            )?,
            weight_recency: Self::parse_from_env(
                Self::ENV_WEIGHT_RECENCY,
                defaults.weight_recency,
                "f64",
            )?,
            weight_metadata: Self::parse_from_env(
                Self::ENV_WEIGHT_METADATA,
                defaults.weight_metadata,
                "f64",
            )?,
            cache_ttl_query_s: Self::parse_from_env(
                Self::ENV_CACHE_TTL_QUERY_S,
                defaults.cache_ttl_query_s,
                "u64",
            )?,
            cache_ttl_feature_s: Self::parse_from_env(
                Self::ENV_CACHE_TTL_FEATURE_S,
                defaults.cache_ttl_feature_s,
                "u64",
            )?,
            retrieval_timeout_ms: Self::parse_from_env(
                Self::ENV_RETRIEVAL_TIMEOUT_MS,
                defaults.retrieval_timeout_ms,
                "u64",
            )?,
            embed_timeout_ms: Self::parse_from_env(
                Self::ENV_EMBED_TIMEOUT_MS,
                defaults.embed_timeout_ms,
                "u64",
            )?,
            ltr_timeout_ms: Self::parse_from_env(
                Self::ENV_LTR_TIMEOUT_MS,
                defaults.ltr_timeout_ms,
                "u64",
            )?,
            max_candidates: Self::parse_from_env(
                Self::ENV_MAX_CANDIDATES,
                defaults.max_candidates,
                "usize",
            )?,
            candidate_multiplier: Self::parse_from_env(
                Self::ENV_CANDIDATE_MULTIPLIER,
                defaults.candidate_multiplier,
                "u32",
            )?,
            pipeline_budget_ms: Self::parse_from_env(
                Self::ENV_PIPELINE_BUDGET_MS,
                defaults.pipeline_budget_ms,
                "u64",
            )?,
            tenant_required: Self::parse_from_env(
                Self::ENV_TENANT_REQUIRED,
                defaults.tenant_required,
                "bool",
            )?,
            embed_max_inflight: Self::parse_from_env(
                Self::ENV_EMBED_MAX_INFLIGHT,
                defaults.embed_max_inflight,
                "usize",
            )?,
            retrieve_max_inflight: Self::parse_from_env(
                Self::ENV_RETRIEVE_MAX_INFLIGHT,
                defaults.retrieve_max_inflight,
                "usize",
            )?,
            vector_store_url: Self::string_from_env(
                Self::ENV_VECTOR_STORE_URL,
                defaults.vector_store_url,
            ),
            bind_addr: Self::string_from_env(Self::ENV_BIND_ADDR, defaults.bind_addr),
            port: Self::parse_from_env(Self::ENV_PORT, defaults.port, "u16")?,
        })
    }

    /// Validates cross-field invariants that `from_env` alone cannot express
    /// (e.g. a zero dimension is syntactically valid `u32` but not a usable
    /// embedding dimension).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embed_dim == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_EMBED_DIM,
                value: "0".to_string(),
                expected: "a positive embedding dimension",
            });
        }
        if self.top_k_default < 1 || self.top_k_default > crate::constants::MAX_TOP_K {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_TOP_K_DEFAULT,
                value: self.top_k_default.to_string(),
                expected: "a value in 1..=100",
            });
        }
        if self.max_candidates == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_MAX_CANDIDATES,
                value: "0".to_string(),
                expected: "a positive candidate cap",
            });
        }
        Ok(())
    }

    /// Builds the initial [`WeightSet`] (version 1) from the configured
    /// fusion and conceptual sub-weights, for seeding a [`Registry`].
    pub fn initial_weight_set(&self) -> WeightSet {
        WeightSet {
            version: 1,
            ltr: self.fusion_ltr_weight,
            conceptual: self.fusion_conceptual_weight,
            distance: self.weight_distance,
            recency: self.weight_recency,
            metadata: self.weight_metadata,
        }
    }

    /// Returns `"bind_addr:port"`, used only by the demo binary's banner.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_from_env<T>(var_name: &'static str, default: T, expected: &'static str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
    {
        match env::var(var_name) {
            Ok(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidValue {
                name: var_name,
                value: raw,
                expected,
            }),
            Err(_) => Ok(default),
        }
    }
}
