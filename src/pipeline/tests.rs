use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use super::error::PipelineError;
use super::orchestrator::Orchestrator;
use crate::cache::CacheLayer;
use crate::config::{Config, Registry};
use crate::domain::{Candidate, Query};
use crate::embedding::{EmbedResult, EmbeddingError, EmbeddingGateway, MockEmbeddingGateway};
use crate::metrics::MetricsCollector;
use crate::retrieval::MockVectorRetriever;

fn test_config() -> Config {
    Config {
        embed_dim: 8,
        max_candidates: 50,
        candidate_multiplier: 5,
        cache_ttl_query_s: 300,
        cache_ttl_feature_s: 300,
        ..Config::default()
    }
}

fn fresh_cache() -> CacheLayer {
    CacheLayer::new(Duration::from_secs(300), Duration::from_secs(300), Duration::from_secs(300))
}

fn candidate(id: &str, distance: f64, token_count: u32) -> Candidate {
    Candidate {
        chunk_id: id.to_string(),
        document_id: format!("doc-{id}"),
        ordinal: 0,
        text: format!("chunk text for {id}"),
        token_count: Some(token_count),
        distance,
        provenance: "mock".to_string(),
        metadata: HashMap::new(),
    }
}

fn base_orchestrator() -> Orchestrator<MockEmbeddingGateway, MockVectorRetriever> {
    let config = test_config();
    let registry = Registry::new(config.initial_weight_set());
    Orchestrator::new(
        config,
        MockEmbeddingGateway::new(),
        MockVectorRetriever::new(),
        fresh_cache(),
        MetricsCollector::new(),
        registry,
    )
}

fn seed_three_candidates(retriever: &MockVectorRetriever, query_vector: Vec<f32>) {
    retriever.seed(
        "chunks",
        query_vector.clone(),
        candidate("a", 0.1, 50),
    );
    let mut far1 = query_vector.clone();
    far1[0] += 1.0;
    retriever.seed("chunks", far1, candidate("b", 0.2, 100));
    let mut far2 = query_vector.clone();
    far2[0] += 2.0;
    retriever.seed("chunks", far2, candidate("c", 0.3, 200));
}

#[tokio::test]
async fn happy_path_returns_results_ordered_by_fused_score() {
    let config = test_config();
    let registry = Registry::new(config.initial_weight_set());
    let embedding = MockEmbeddingGateway::new();
    let probe = embedding.embed(&["hello world".to_string()], 8).await.unwrap();
    let retriever = MockVectorRetriever::new();
    seed_three_candidates(&retriever, probe.vectors[0].clone());

    let orchestrator = Orchestrator::new(config, embedding, retriever, fresh_cache(), MetricsCollector::new(), registry);

    let response = orchestrator
        .query(Query {
            text: "hello world".to_string(),
            top_k: Some(3),
            tenant: None,
            bypass_cache: false,
            fusion_weights_override: None,
        })
        .await
        .unwrap();

    assert_eq!(response.results.len(), 3);
    assert!(!response.cache);
    // Fused scores are sorted descending.
    for pair in response.results.windows(2) {
        assert!(pair[0].fused_score >= pair[1].fused_score);
    }
}

#[tokio::test]
async fn cache_hit_on_second_identical_request() {
    let config = test_config();
    let registry = Registry::new(config.initial_weight_set());
    let embedding = MockEmbeddingGateway::new();
    let probe = embedding.embed(&["repeat query".to_string()], 8).await.unwrap();
    let retriever = MockVectorRetriever::new();
    seed_three_candidates(&retriever, probe.vectors[0].clone());

    let orchestrator = Orchestrator::new(config, embedding, retriever, fresh_cache(), MetricsCollector::new(), registry);

    let query = Query {
        text: "repeat query".to_string(),
        top_k: Some(3),
        tenant: None,
        bypass_cache: false,
        fusion_weights_override: None,
    };

    let first = orchestrator.query(query.clone()).await.unwrap();
    assert!(!first.cache);

    let second = orchestrator.query(query).await.unwrap();
    assert!(second.cache);
    assert_eq!(second.timings_ms.embed, 0);
    assert_eq!(second.timings_ms.retrieve, 0);
    assert_eq!(second.results.len(), first.results.len());
}

#[tokio::test]
async fn bypass_cache_never_reads_or_writes_the_query_cache() {
    let config = test_config();
    let registry = Registry::new(config.initial_weight_set());
    let embedding = MockEmbeddingGateway::new();
    let probe = embedding.embed(&["bypass query".to_string()], 8).await.unwrap();
    let retriever = MockVectorRetriever::new();
    seed_three_candidates(&retriever, probe.vectors[0].clone());

    let orchestrator = Orchestrator::new(config, embedding, retriever, fresh_cache(), MetricsCollector::new(), registry);

    let query = Query {
        text: "bypass query".to_string(),
        top_k: Some(3),
        tenant: None,
        bypass_cache: true,
        fusion_weights_override: None,
    };

    let first = orchestrator.query(query.clone()).await.unwrap();
    let second = orchestrator.query(query).await.unwrap();
    assert!(!first.cache);
    assert!(!second.cache);
}

#[tokio::test]
async fn partial_retrieval_yields_degraded_but_successful_response() {
    let orchestrator = base_orchestrator();
    // No candidates seeded: the retriever returns an empty result set.
    let response = orchestrator
        .query(Query {
            text: "no candidates here".to_string(),
            top_k: Some(10),
            tenant: None,
            bypass_cache: true,
            fusion_weights_override: None,
        })
        .await
        .unwrap();

    assert!(response.results.is_empty());
    assert!(response.degraded);
}

#[tokio::test]
async fn retrieval_stage_timeout_salvages_partial_candidates() {
    let mut config = test_config();
    config.retrieval_timeout_ms = 25;
    let registry = Registry::new(config.initial_weight_set());
    let embedding = MockEmbeddingGateway::new();
    let probe = embedding.embed(&["slow store query".to_string()], 8).await.unwrap();
    let retriever = MockVectorRetriever::new();

    // Seed 10 candidates but make the store stream them one at a time, 10ms
    // apart, so only the first 2 arrive before the 25ms stage deadline.
    for i in 0..10 {
        let mut vector = probe.vectors[0].clone();
        vector[0] += i as f32;
        retriever.seed("chunks", vector, candidate(&format!("c{i}"), 0.1 * i as f64, 10));
    }
    retriever.stream_with_delay(Duration::from_millis(10));

    let orchestrator = Orchestrator::new(config, embedding, retriever, fresh_cache(), MetricsCollector::new(), registry);

    let response = orchestrator
        .query(Query {
            text: "slow store query".to_string(),
            top_k: Some(10),
            tenant: None,
            bypass_cache: true,
            fusion_weights_override: None,
        })
        .await
        .unwrap();

    assert_eq!(response.results.len(), 2);
    assert!(response.degraded);
}

#[tokio::test]
async fn retrieval_stage_timeout_with_no_candidates_fails_the_request() {
    let mut config = test_config();
    config.retrieval_timeout_ms = 10;
    let registry = Registry::new(config.initial_weight_set());
    let embedding = MockEmbeddingGateway::new();
    let probe = embedding.embed(&["stalled query".to_string()], 8).await.unwrap();
    let retriever = MockVectorRetriever::new();
    retriever.seed("chunks", probe.vectors[0].clone(), candidate("only", 0.1, 10));
    retriever.stream_with_delay(Duration::from_millis(50));

    let orchestrator = Orchestrator::new(config, embedding, retriever, fresh_cache(), MetricsCollector::new(), registry);

    let result = orchestrator
        .query(Query {
            text: "stalled query".to_string(),
            top_k: Some(10),
            tenant: None,
            bypass_cache: true,
            fusion_weights_override: None,
        })
        .await;

    assert!(matches!(
        result,
        Err(PipelineError::Retrieval(crate::retrieval::RetrievalError::Timeout { .. }))
    ));
}

#[tokio::test]
async fn top_k_zero_is_rejected_as_input_error() {
    let orchestrator = base_orchestrator();
    let result = orchestrator
        .query(Query {
            text: "anything".to_string(),
            top_k: Some(0),
            tenant: None,
            bypass_cache: true,
            fusion_weights_override: None,
        })
        .await;

    assert!(matches!(result, Err(PipelineError::Input { .. })));
}

#[tokio::test]
async fn empty_query_text_is_rejected_as_input_error() {
    let orchestrator = base_orchestrator();
    let result = orchestrator
        .query(Query {
            text: String::new(),
            top_k: Some(10),
            tenant: None,
            bypass_cache: true,
            fusion_weights_override: None,
        })
        .await;

    assert!(matches!(result, Err(PipelineError::Input { .. })));
}

/// A gateway that always reports `degraded=true` with zero vectors, to
/// exercise the embedding-fallback path without depending on a live HTTP
/// backend.
struct AlwaysDegradedGateway {
    dim: u32,
}

impl EmbeddingGateway for AlwaysDegradedGateway {
    fn embed(
        &self,
        _batch: &[String],
        _expected_dim: u32,
    ) -> impl Future<Output = Result<EmbedResult, EmbeddingError>> + Send {
        let dim = self.dim;
        async move {
            Ok(EmbedResult {
                vectors: vec![vec![0.0; dim as usize]],
                degraded: true,
            })
        }
    }
}

#[tokio::test]
async fn embedding_fallback_marks_response_degraded_with_zero_vector() {
    let config = test_config();
    let registry = Registry::new(config.initial_weight_set());
    let dim = config.embed_dim;
    let retriever = MockVectorRetriever::new();
    seed_three_candidates(&retriever, vec![0.0; dim as usize]);

    let orchestrator = Orchestrator::new(
        config,
        AlwaysDegradedGateway { dim },
        retriever,
        fresh_cache(),
        MetricsCollector::new(),
        registry,
    );

    let response = orchestrator
        .query(Query {
            text: "degrade me".to_string(),
            top_k: Some(3),
            tenant: None,
            bypass_cache: true,
            fusion_weights_override: None,
        })
        .await
        .unwrap();

    assert!(response.degraded);
    assert_eq!(response.timings_ms.embed, crate::constants::TIMING_DEGRADED_SENTINEL_MS);
}

/// A gateway that always returns a vector one dimension too long.
struct WrongDimensionGateway;

impl EmbeddingGateway for WrongDimensionGateway {
    fn embed(
        &self,
        _batch: &[String],
        expected_dim: u32,
    ) -> impl Future<Output = Result<EmbedResult, EmbeddingError>> + Send {
        async move {
            Ok(EmbedResult {
                vectors: vec![vec![0.0; expected_dim as usize + 1]],
                degraded: false,
            })
        }
    }
}

#[tokio::test]
async fn dimension_mismatch_is_fatal_regardless_of_fallback_policy() {
    let orchestrator = Orchestrator::new(
        test_config(),
        WrongDimensionGateway,
        MockVectorRetriever::new(),
        fresh_cache(),
        MetricsCollector::new(),
        Registry::new(test_config().initial_weight_set()),
    );

    let result = orchestrator
        .query(Query {
            text: "mismatch".to_string(),
            top_k: Some(3),
            tenant: None,
            bypass_cache: true,
            fusion_weights_override: None,
        })
        .await;

    assert!(matches!(result, Err(PipelineError::Embed(EmbeddingError::DimensionMismatch { .. }))));
}

#[tokio::test]
async fn weights_hot_swap_is_invisible_to_an_in_flight_request_snapshot() {
    let config = test_config();
    let registry = Registry::new(config.initial_weight_set());

    let snapshot_before = registry.get_active_weights();
    assert_eq!(snapshot_before.version, 1);

    registry
        .put_weights(crate::config::WeightSetInput {
            ltr: 0.9,
            conceptual: 0.1,
            distance: 0.7,
            recency: 0.2,
            metadata: 0.1,
        })
        .unwrap();

    // The snapshot taken before the publish still reports the old version.
    assert_eq!(snapshot_before.version, 1);
    assert_eq!(registry.get_active_weights().version, 2);
}
