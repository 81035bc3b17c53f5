//! Pipeline orchestrator: the `query()` entry point wiring every
//! component together, built by dependency injection over concrete
//! `EmbeddingGateway`/`VectorRetriever` handles.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{instrument, warn};

use crate::cache::{BinaryCodec, CacheLayer, JsonCodec, Namespace};
use crate::config::Config;
use crate::config::Registry;
use crate::constants::{TIMING_DEGRADED_SENTINEL_MS, TIMING_SKIPPED_MS};
use crate::domain::{Candidate, ModelKind, Query};
use crate::embedding::EmbeddingGateway;
use crate::feature;
use crate::fusion;
use crate::hashing;
use crate::metrics::{MetricsCollector, Stage};
use crate::retrieval::VectorRetriever;
use crate::scoring::{conceptual, LtrStrategy};

use super::error::PipelineError;
use super::response::{ModelsInfo, QueryResponse, TimingsMs, WeightsInfo};

/// Outcome of a single-text embed call: the vector plus whether it came
/// from a fallback (degraded) path.
struct EmbedOutcome {
    vector: Vec<f32>,
    degraded: bool,
}

/// Orchestrates one request end to end: validate → cache lookup → embed →
/// retrieve → assemble features → score → fuse → package.
///
/// Constructed once at startup with concrete collaborators (dependency
/// injection) and shared across requests via `Arc`, built once and threaded
/// through request-handling code rather than rebuilt per request.
pub struct Orchestrator<E, R>
where
    E: EmbeddingGateway,
    R: VectorRetriever,
{
    config: Config,
    embedding: E,
    retriever: R,
    cache: CacheLayer,
    metrics: MetricsCollector,
    registry: Registry,
    embed_semaphore: Semaphore,
    retrieve_semaphore: Semaphore,
}

impl<E, R> Orchestrator<E, R>
where
    E: EmbeddingGateway,
    R: VectorRetriever,
{
    /// Builds an orchestrator from its concrete collaborators.
    pub fn new(
        config: Config,
        embedding: E,
        retriever: R,
        cache: CacheLayer,
        metrics: MetricsCollector,
        registry: Registry,
    ) -> Self {
        let embed_semaphore = Semaphore::new(config.embed_max_inflight);
        let retrieve_semaphore = Semaphore::new(config.retrieve_max_inflight);
        Self {
            config,
            embedding,
            retriever,
            cache,
            metrics,
            registry,
            embed_semaphore,
            retrieve_semaphore,
        }
    }

    /// Runs one query through the full pipeline.
    #[instrument(skip(self, query), fields(top_k))]
    pub async fn query(&self, query: Query) -> Result<QueryResponse, PipelineError> {
        let started = Instant::now();
        self.metrics.record_request();

        let top_k = self.validated_top_k(query.top_k)?;
        self.validated_query_text(&query.text)?;
        tracing::Span::current().record("top_k", top_k);

        let weights_snapshot = match query.fusion_weights_override {
            Some(overrides) => {
                let mut w = (*self.registry.get_active_weights()).clone();
                w.ltr = overrides.ltr;
                w.conceptual = overrides.conceptual;
                w
            }
            None => (*self.registry.get_active_weights()).clone(),
        };

        let embedding_model_id = self.active_model_identifier(ModelKind::Embedding, "default-embed@0");
        let ltr_model_id = self.active_model_identifier(ModelKind::Ltr, "default-linear@0");
        let version_tag = hashing::version_tag(&embedding_model_id, &ltr_model_id, weights_snapshot.version);

        if !query.bypass_cache {
            if let Some(cached) =
                self.cache
                    .get_query(&query.text, query.tenant.as_deref(), top_k, &version_tag)
            {
                if let Ok(mut response) = JsonCodec::decode::<QueryResponse>(&cached) {
                    self.metrics.record_cache_hit(Namespace::Query);
                    response.cache = true;
                    // None of the downstream stages ran for a cache hit:
                    // only `total` reflects real elapsed time.
                    response.timings_ms.embed = TIMING_SKIPPED_MS;
                    response.timings_ms.retrieve = TIMING_SKIPPED_MS;
                    response.timings_ms.feature = TIMING_SKIPPED_MS;
                    response.timings_ms.ltr = TIMING_SKIPPED_MS;
                    response.timings_ms.fusion = TIMING_SKIPPED_MS;
                    response.timings_ms.total = started.elapsed().as_millis() as i64;
                    return Ok(response);
                }
            }
        }

        let mut degraded = false;

        let (embed_vector, embed_timing_ms) =
            self.embed_query(&query.text, &embedding_model_id, started).await?;
        degraded |= embed_vector.degraded;
        let embed_ms = if embed_vector.degraded {
            TIMING_DEGRADED_SENTINEL_MS
        } else {
            embed_timing_ms
        };

        let retrieval_limit = (top_k as u64 * self.config.candidate_multiplier as u64)
            .min(self.config.max_candidates as u64);
        let (candidates, retrieve_ms, partial) = self
            .retrieve_candidates(embed_vector.vector, retrieval_limit, query.tenant.as_deref(), started)
            .await?;
        degraded |= partial;

        if candidates.is_empty() {
            degraded = true;
        }

        let feature_schema_tag = crate::domain::FEATURE_SCHEMA_V1.to_string();
        let feature_start = Instant::now();
        let features = feature::assemble(
            &candidates,
            &self.cache,
            self.config.cache_ttl_feature_s,
            &feature_schema_tag,
        );
        let feature_ms = feature_start.elapsed().as_millis() as i64;
        self.metrics.record_stage_latency(Stage::Feature, feature_ms as f64, now_unix());

        let ltr_model = self.active_ltr_strategy()?;

        // Both streams are pure, CPU-only computations with no blocking
        // points; run sequentially rather than via a fake async join, which
        // would not actually parallelize single-threaded work.
        let ltr_start = Instant::now();
        let ltr_scores = ltr_model.score(&features);
        let conceptual_scores =
            conceptual::score(&candidates, &features, &weights_snapshot, &query.text, now_unix());
        let ltr_ms = ltr_start.elapsed().as_millis() as i64;
        self.metrics.record_stage_latency(Stage::Ltr, ltr_ms as f64, now_unix());

        let fusion_start = Instant::now();
        let scored = fusion::fuse(&candidates, &features, &ltr_scores, &conceptual_scores, &weights_snapshot);
        let fusion_ms = fusion_start.elapsed().as_millis() as i64;
        self.metrics.record_stage_latency(Stage::Fusion, fusion_ms as f64, now_unix());

        let total_ms = started.elapsed().as_millis() as i64;
        self.metrics.record_stage_latency(Stage::Pipeline, total_ms as f64, now_unix());

        let response = QueryResponse {
            results: QueryResponse::results_from_scored(&scored, top_k),
            weights: WeightsInfo {
                ltr: weights_snapshot.ltr,
                conceptual: weights_snapshot.conceptual,
                version: weights_snapshot.version,
            },
            models: ModelsInfo {
                embedding: embedding_model_id,
                ltr: ltr_model_id,
            },
            timings_ms: TimingsMs {
                embed: embed_ms,
                retrieve: retrieve_ms,
                feature: feature_ms,
                ltr: ltr_ms,
                fusion: fusion_ms,
                total: total_ms,
            },
            cache: false,
            degraded,
            version_tag: version_tag.clone(),
        };

        if !query.bypass_cache {
            if let Ok(encoded) = JsonCodec::encode(&response) {
                self.cache.set_query(
                    &query.text,
                    query.tenant.as_deref(),
                    top_k,
                    &version_tag,
                    encoded,
                    Duration::from_secs(self.config.cache_ttl_query_s),
                );
            }
        }

        Ok(response)
    }

    fn validated_top_k(&self, requested: Option<u32>) -> Result<u32, PipelineError> {
        let top_k = requested.unwrap_or(self.config.top_k_default);
        if top_k < crate::constants::MIN_TOP_K || top_k > crate::constants::MAX_TOP_K {
            return Err(PipelineError::Input {
                reason: format!(
                    "top_k must be in {}..={}, got {top_k}",
                    crate::constants::MIN_TOP_K,
                    crate::constants::MAX_TOP_K
                ),
            });
        }
        Ok(top_k)
    }

    fn validated_query_text(&self, text: &str) -> Result<(), PipelineError> {
        if text.is_empty() {
            return Err(PipelineError::Input {
                reason: "query text must not be empty".to_string(),
            });
        }
        if text.chars().count() > crate::constants::MAX_QUERY_CHARS {
            return Err(PipelineError::Input {
                reason: format!(
                    "query text exceeds {} characters",
                    crate::constants::MAX_QUERY_CHARS
                ),
            });
        }
        Ok(())
    }

    fn active_model_identifier(&self, kind: ModelKind, fallback: &str) -> String {
        self.registry
            .get_active_model(kind)
            .map(|entry| entry.identifier())
            .unwrap_or_else(|| fallback.to_string())
    }

    fn active_ltr_strategy(&self) -> Result<LtrStrategy, PipelineError> {
        match self.registry.get_active_model(ModelKind::Ltr) {
            Some(entry) => Ok(LtrStrategy::from_model_entry(&entry, crate::domain::FEATURE_SCHEMA_V1)?),
            None => {
                let identity = crate::scoring::LinearModel::from_coefficients(
                    vec![1.0, 0.0, 0.0],
                    crate::domain::FEATURE_SCHEMA_V1,
                )
                .expect("three literal coefficients always match the v1 schema");
                Ok(LtrStrategy::Linear(identity))
            }
        }
    }

    /// Time left in the request's global pipeline budget (§4.10), floored at
    /// zero rather than going negative once `started` has already elapsed it.
    fn remaining_budget(&self, started: Instant) -> Duration {
        Duration::from_millis(self.config.pipeline_budget_ms).saturating_sub(started.elapsed())
    }

    async fn embed_query(
        &self,
        text: &str,
        embedding_model_id: &str,
        started: Instant,
    ) -> Result<(EmbedOutcome, i64), PipelineError> {
        let text_hash = hashing::hash_text(text);
        if let Some(cached) = self.cache.get(Namespace::Embed, &text_hash, embedding_model_id) {
            if let Ok(vector) = BinaryCodec::decode(&cached) {
                self.metrics.record_cache_hit(Namespace::Embed);
                return Ok((EmbedOutcome { vector, degraded: false }, TIMING_SKIPPED_MS));
            }
        }

        // Bounded FIFO wait: block for whatever's left of the request budget
        // rather than rejecting on the first moment of contention.
        let _permit = tokio::time::timeout(self.remaining_budget(started), self.embed_semaphore.acquire())
            .await
            .map_err(|_| PipelineError::Overload { resource: "embed" })?
            .map_err(|_| PipelineError::Overload { resource: "embed" })?;

        let embed_start = Instant::now();
        let deadline = Duration::from_millis(self.config.embed_timeout_ms);
        let batch = vec![text.to_string()];

        let result = tokio::time::timeout(deadline, self.embedding.embed(&batch, self.config.embed_dim))
            .await
            .map_err(|_| PipelineError::Timeout { stage: "embed" })??;

        let embed_ms = embed_start.elapsed().as_millis() as i64;
        self.metrics.record_stage_latency(Stage::Embed, embed_ms as f64, now_unix());

        let vector = result
            .vectors
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Embed(crate::embedding::EmbeddingError::CountMismatch {
                sent: 1,
                received: 0,
            }))?;

        if vector.len() as u32 != self.config.embed_dim {
            return Err(PipelineError::Embed(crate::embedding::EmbeddingError::DimensionMismatch {
                expected: self.config.embed_dim,
                actual: vector.len() as u32,
            }));
        }

        if !result.degraded {
            if let Ok(encoded) = BinaryCodec::encode(&vector) {
                self.cache.set(
                    Namespace::Embed,
                    &text_hash,
                    embedding_model_id,
                    encoded,
                    Duration::from_secs(crate::constants::DEFAULT_CACHE_TTL_EMBED_S),
                );
            }
        }

        Ok((
            EmbedOutcome {
                vector,
                degraded: result.degraded,
            },
            embed_ms,
        ))
    }

    async fn retrieve_candidates(
        &self,
        query_vector: Vec<f32>,
        limit: u64,
        tenant: Option<&str>,
        started: Instant,
    ) -> Result<(Vec<Candidate>, i64, bool), PipelineError> {
        // Bounded FIFO wait: block for whatever's left of the request budget
        // rather than rejecting on the first moment of contention.
        let _permit = tokio::time::timeout(self.remaining_budget(started), self.retrieve_semaphore.acquire())
            .await
            .map_err(|_| PipelineError::Overload { resource: "retrieve" })?
            .map_err(|_| PipelineError::Overload { resource: "retrieve" })?;

        let retrieve_start = Instant::now();
        let deadline = Duration::from_millis(self.config.retrieval_timeout_ms);
        let partial: Arc<Mutex<Vec<Candidate>>> = Arc::new(Mutex::new(Vec::new()));

        let result = tokio::time::timeout(
            deadline,
            self.retriever
                .search_partial("chunks", query_vector, limit, tenant, Arc::clone(&partial)),
        )
        .await;

        let retrieve_ms = retrieve_start.elapsed().as_millis() as i64;
        self.metrics.record_stage_latency(Stage::Retrieve, retrieve_ms as f64, now_unix());

        match result {
            Ok(Ok(candidates)) => Ok((candidates, retrieve_ms, false)),
            Ok(Err(e)) => {
                warn!(error = %e, "retrieval failed");
                Err(PipelineError::Retrieval(e))
            }
            Err(_) => {
                // Stage deadline elapsed: salvage whatever the retriever had
                // already pushed into `partial` (§4.5, §8 scenario 6). Only
                // when nothing arrived at all does the timeout fail the
                // request outright.
                let salvaged = std::mem::take(&mut *partial.lock().unwrap());
                if salvaged.is_empty() {
                    warn!("retrieval timed out before any candidates arrived");
                    Err(PipelineError::Retrieval(crate::retrieval::RetrievalError::Timeout {
                        collection: "chunks".to_string(),
                    }))
                } else {
                    warn!(
                        candidates = salvaged.len(),
                        "retrieval timed out with partial candidates, returning degraded response"
                    );
                    Ok((salvaged, retrieve_ms, true))
                }
            }
        }
    }
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
