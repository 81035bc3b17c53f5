//! Demo/introspection binary for the retrieval and ranking core.
//!
//! The core is a library; the HTTP/transport layer that would normally
//! expose `Query`/`Weights`/`Health` over a network is an external
//! collaborator (§1, out of scope). This binary exists to boot the
//! orchestrator the way a real service would, run one query end to end,
//! and print the resulting response and health snapshot — useful for local
//! smoke-testing a configured embedding endpoint and vector store.

use std::time::Instant;

use ragcore::config::{Config, Registry};
use ragcore::domain::{ModelEntry, ModelKind, ModelStatus, Query};
use ragcore::metrics::MetricsCollector;
use ragcore::pipeline::HealthReporter;
use ragcore::{CacheLayer, Orchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        embed_dim = config.embed_dim,
        "ragcore demo binary starting"
    );

    let registry = Registry::new(config.initial_weight_set());
    registry.register_model(ModelEntry {
        name: "identity-linear".to_string(),
        kind: ModelKind::Ltr,
        version: 1,
        dimension: None,
        artifact: "1.0,0.0,0.0".to_string(),
        status: ModelStatus::Active,
    })?;

    let cache = CacheLayer::new(
        std::time::Duration::from_secs(config.cache_ttl_query_s),
        std::time::Duration::from_secs(config.cache_ttl_feature_s),
        std::time::Duration::from_secs(ragcore::constants::DEFAULT_CACHE_TTL_EMBED_S),
    );
    let metrics = MetricsCollector::new();
    let started_at = Instant::now();

    run_with_backends(config, registry, cache, metrics, started_at).await
}

#[cfg(feature = "mock")]
async fn run_with_backends(
    config: Config,
    registry: Registry,
    cache: CacheLayer,
    metrics: MetricsCollector,
    started_at: Instant,
) -> anyhow::Result<()> {
    use ragcore::domain::Candidate;
    use ragcore::{MockEmbeddingGateway, MockVectorRetriever};
    use std::collections::HashMap;

    tracing::warn!("no EMBED_ENDPOINT/VECTOR_STORE_URL backends wired; using in-memory mocks");

    let embedding = MockEmbeddingGateway::new();
    let retriever = MockVectorRetriever::new();
    retriever.seed(
        "chunks",
        vec![0.1; config.embed_dim as usize],
        Candidate {
            chunk_id: "chunk-1".to_string(),
            document_id: "doc-1".to_string(),
            ordinal: 0,
            text: "Rust's ownership model prevents data races at compile time.".to_string(),
            token_count: Some(10),
            distance: 0.0,
            provenance: "mock".to_string(),
            metadata: HashMap::new(),
        },
    );

    let health = HealthReporter::new(registry.clone(), cache.clone(), metrics.clone(), started_at);
    let orchestrator = Orchestrator::new(config, embedding, retriever, cache, metrics, registry);
    demo_query(&orchestrator, &health).await
}

#[cfg(not(feature = "mock"))]
async fn run_with_backends(
    config: Config,
    registry: Registry,
    cache: CacheLayer,
    metrics: MetricsCollector,
    started_at: Instant,
) -> anyhow::Result<()> {
    use ragcore::{HttpEmbeddingGateway, QdrantVectorRetriever};

    let embedding = HttpEmbeddingGateway::new(
        config.embed_endpoint.clone(),
        std::time::Duration::from_millis(config.embed_timeout_ms),
        config.allow_embed_fallback,
    )?;
    let retriever = QdrantVectorRetriever::new(&config.vector_store_url)?;

    let health = HealthReporter::new(registry.clone(), cache.clone(), metrics.clone(), started_at);
    let orchestrator = Orchestrator::new(config, embedding, retriever, cache, metrics, registry);
    demo_query(&orchestrator, &health).await
}

async fn demo_query<E, R>(
    orchestrator: &Orchestrator<E, R>,
    health: &HealthReporter,
) -> anyhow::Result<()>
where
    E: ragcore::EmbeddingGateway,
    R: ragcore::VectorRetriever,
{
    let query = Query {
        text: "how does ownership prevent data races in rust".to_string(),
        top_k: Some(5),
        tenant: None,
        bypass_cache: false,
        fusion_weights_override: None,
    };

    match orchestrator.query(query).await {
        Ok(response) => {
            let json = serde_json::to_string_pretty(&response)?;
            println!("{json}");
        }
        Err(e) => {
            tracing::error!(error = %e, "demo query failed");
        }
    }

    let snapshot = health.snapshot(chrono::Utc::now().timestamp());
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}
