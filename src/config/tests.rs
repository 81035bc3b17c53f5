use super::*;
use serial_test::serial;
use std::env;

fn clear_all_env() {
    for var in [
        Config::ENV_EMBED_ENDPOINT,
        Config::ENV_EMBED_DIM,
        Config::ENV_ALLOW_EMBED_FALLBACK,
        Config::ENV_TOP_K_DEFAULT,
        Config::ENV_FUSION_LTR_WEIGHT,
        Config::ENV_FUSION_CONCEPTUAL_WEIGHT,
        Config::ENV_WEIGHT_DISTANCE,
        Config::ENV_WEIGHT_RECENCY,
        Config::ENV_WEIGHT_METADATA,
        Config::ENV_CACHE_TTL_QUERY_S,
        Config::ENV_CACHE_TTL_FEATURE_S,
        Config::ENV_RETRIEVAL_TIMEOUT_MS,
        Config::ENV_EMBED_TIMEOUT_MS,
        Config::ENV_LTR_TIMEOUT_MS,
        Config::ENV_MAX_CANDIDATES,
        Config::ENV_CANDIDATE_MULTIPLIER,
        Config::ENV_PIPELINE_BUDGET_MS,
        Config::ENV_TENANT_REQUIRED,
        Config::ENV_EMBED_MAX_INFLIGHT,
        Config::ENV_RETRIEVE_MAX_INFLIGHT,
        Config::ENV_VECTOR_STORE_URL,
        Config::ENV_BIND_ADDR,
        Config::ENV_PORT,
    ] {
        unsafe { env::remove_var(var) };
    }
}

#[test]
#[serial]
fn from_env_uses_defaults_when_unset() {
    clear_all_env();
    let config = Config::from_env().unwrap();
    assert_eq!(config.embed_dim, crate::constants::DEFAULT_EMBED_DIM as u32);
    assert_eq!(config.top_k_default, crate::constants::DEFAULT_TOP_K);
    assert!(!config.allow_embed_fallback);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn from_env_reads_overrides() {
    clear_all_env();
    unsafe {
        env::set_var(Config::ENV_EMBED_DIM, "768");
        env::set_var(Config::ENV_ALLOW_EMBED_FALLBACK, "true");
        env::set_var(Config::ENV_TOP_K_DEFAULT, "25");
    }
    let config = Config::from_env().unwrap();
    assert_eq!(config.embed_dim, 768);
    assert!(config.allow_embed_fallback);
    assert_eq!(config.top_k_default, 25);
    clear_all_env();
}

#[test]
#[serial]
fn from_env_rejects_unparseable_value() {
    clear_all_env();
    unsafe { env::set_var(Config::ENV_EMBED_DIM, "not-a-number") };
    let err = Config::from_env();
    assert!(err.is_err());
    clear_all_env();
}

#[test]
#[serial]
fn validate_rejects_zero_dimension() {
    clear_all_env();
    let mut config = Config::default();
    config.embed_dim = 0;
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn validate_rejects_out_of_range_top_k_default() {
    clear_all_env();
    let mut config = Config::default();
    config.top_k_default = 0;
    assert!(config.validate().is_err());

    config.top_k_default = 101;
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn initial_weight_set_matches_configured_fields() {
    clear_all_env();
    let config = Config::default();
    let weights = config.initial_weight_set();
    assert_eq!(weights.version, 1);
    assert_eq!(weights.ltr, config.fusion_ltr_weight);
    assert_eq!(weights.conceptual, config.fusion_conceptual_weight);
}

#[test]
#[serial]
fn socket_addr_formats_bind_and_port() {
    clear_all_env();
    let config = Config::default();
    assert_eq!(config.socket_addr(), format!("{}:{}", config.bind_addr, config.port));
}
