//! Multi-tier cache layer: three namespaced, independently-capacitied
//! in-process stores (query-response, feature vector, embedding) sharing one
//! codec abstraction, so a namespace flush or TTL policy never touches
//! another namespace's entries.
//!
//! Misses are never errors. Transient codec/lookup failures are logged and
//! converted to misses at this boundary — the pipeline proceeds without the
//! cache rather than failing the request.

pub mod codec;
pub mod error;


pub use codec::{BinaryCodec, JsonCodec};
pub use error::CacheError;

use std::time::Duration;

use moka::sync::Cache as MokaCache;
use tracing::warn;

use crate::domain::CacheEntry;
use crate::hashing;

/// The three logical namespaces the cache layer exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// `query:<query_hash>:<version_tag>` — full query responses, JSON-encoded.
    Query,
    /// `feat:<candidate_id>:<schema_version>` — per-candidate feature records, JSON-encoded.
    Feature,
    /// `embed:<text_hash>:<embed_model_version>` — raw embedding vectors, binary-encoded.
    Embed,
}

impl Namespace {
    fn prefix(self) -> &'static str {
        match self {
            Namespace::Query => "query",
            Namespace::Feature => "feat",
            Namespace::Embed => "embed",
        }
    }
}

/// Builds the namespaced cache key from a namespace prefix, logical id, and
/// version component (e.g. `query:<hash>:<version_tag>`).
fn build_key(ns: Namespace, logical_id: &str, version_component: &str) -> String {
    format!("{}:{}:{}", ns.prefix(), logical_id, version_component)
}

/// Three independently-capacitied namespaced in-memory stores, one per
/// [`Namespace`], each with its own TTL.
///
/// Cheap to clone: each namespace wraps a [`MokaCache`], itself an `Arc`
/// handle, so a clone shares the same underlying entries rather than
/// copying them (the same handle-sharing convention as [`crate::config::Registry`]).
#[derive(Clone)]
pub struct CacheLayer {
    query: MokaCache<String, CacheEntry>,
    feature: MokaCache<String, CacheEntry>,
    embed: MokaCache<String, CacheEntry>,
}

impl CacheLayer {
    /// Builds a cache layer with the given per-namespace TTLs.
    pub fn new(query_ttl: Duration, feature_ttl: Duration, embed_ttl: Duration) -> Self {
        Self {
            query: MokaCache::builder().time_to_live(query_ttl).build(),
            feature: MokaCache::builder().time_to_live(feature_ttl).build(),
            embed: MokaCache::builder().time_to_live(embed_ttl).build(),
        }
    }

    fn store(&self, ns: Namespace) -> &MokaCache<String, CacheEntry> {
        match ns {
            Namespace::Query => &self.query,
            Namespace::Feature => &self.feature,
            Namespace::Embed => &self.embed,
        }
    }

    /// Looks up `logical_id` within `ns`, requiring the stored entry's
    /// version tag to equal `version_component`. A miss, an expired entry,
    /// or a version mismatch all return `None` (never an error).
    pub fn get(&self, ns: Namespace, logical_id: &str, version_component: &str) -> Option<Vec<u8>> {
        let key = build_key(ns, logical_id, version_component);
        let entry = self.store(ns).get(&key)?;

        let now = chrono::Utc::now().timestamp();
        if entry.is_expired(now) {
            warn!(namespace = ?ns, %key, "cache entry expired at read time, treating as miss");
            self.store(ns).invalidate(&key);
            return None;
        }
        if entry.version_tag != version_component {
            warn!(
                namespace = ?ns,
                %key,
                stored_tag = %entry.version_tag,
                "cache entry version mismatch, treating as miss"
            );
            return None;
        }

        Some(entry.payload)
    }

    /// Stores `payload` under `logical_id` within `ns`, tagged with
    /// `version_component` and expiring after `ttl`.
    pub fn set(
        &self,
        ns: Namespace,
        logical_id: &str,
        version_component: &str,
        payload: Vec<u8>,
        ttl: Duration,
    ) {
        let key = build_key(ns, logical_id, version_component);
        let entry = CacheEntry {
            payload,
            created_at: chrono::Utc::now().timestamp(),
            ttl_secs: ttl.as_secs(),
            version_tag: version_component.to_string(),
        };
        self.store(ns).insert(key, entry);
    }

    /// Removes a single entry.
    pub fn delete(&self, ns: Namespace, logical_id: &str, version_component: &str) {
        let key = build_key(ns, logical_id, version_component);
        self.store(ns).invalidate(&key);
    }

    /// Clears every entry in `ns`, leaving other namespaces untouched.
    pub fn flush(&self, ns: Namespace) {
        self.store(ns).invalidate_all();
    }

    /// Returns the number of live entries in `ns` (approximate; moka is
    /// eventually consistent about expiry bookkeeping).
    pub fn len(&self, ns: Namespace) -> u64 {
        self.store(ns).entry_count()
    }

    /// Convenience: builds the query-namespace key from its logical inputs and performs a lookup.
    pub fn get_query(
        &self,
        query_text: &str,
        tenant: Option<&str>,
        top_k: u32,
        version_tag: &str,
    ) -> Option<Vec<u8>> {
        let query_hash = hashing::hash_query(query_text, tenant, top_k);
        self.get(Namespace::Query, &query_hash, version_tag)
    }

    /// Convenience: stores a query response under its derived key.
    pub fn set_query(
        &self,
        query_text: &str,
        tenant: Option<&str>,
        top_k: u32,
        version_tag: &str,
        payload: Vec<u8>,
        ttl: Duration,
    ) {
        let query_hash = hashing::hash_query(query_text, tenant, top_k);
        self.set(Namespace::Query, &query_hash, version_tag, payload, ttl);
    }
}

impl std::fmt::Debug for CacheLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLayer")
            .field("query_entries", &self.query.entry_count())
            .field("feature_entries", &self.feature.entry_count())
            .field("embed_entries", &self.embed.entry_count())
            .finish()
    }
}
