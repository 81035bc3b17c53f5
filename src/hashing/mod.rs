//! Content-addressed hashing for cache keys and version tags.
//!
//! All hashes are BLAKE3. Cache namespace keys use a 128-bit truncation
//! (`hash_to_u128`), which the cache layer renders as lowercase hex.
//! Composite keys
//! (query text + tenant + top_k, or embedding model + LTR model + weight
//! version) are hashed with an explicit separator byte between fields so
//! that no two distinct field tuples can ever produce the same pre-image.

use blake3::Hasher;

/// Computes the full 256-bit BLAKE3 hash of `data`.
#[inline]
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Truncates a BLAKE3 hash of `data` to the first 64 bits.
///
/// Collision probability follows the birthday bound (~3% at ~4.3 billion
/// items); acceptable for fast in-process indexing where a collision
/// degrades to a cache miss rather than data corruption.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

/// Truncates a BLAKE3 hash of `data` to the first 128 bits, rendered as
/// lowercase hex. Used for cache namespace keys, where 128 bits of
/// collision resistance is appropriate for keys that are never
/// cryptographically verified downstream.
#[inline]
pub fn hash_to_hex128(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    let bytes = &hash.as_bytes()[0..16];
    let mut out = String::with_capacity(32);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// Hashes a sequence of fields with an explicit separator, preventing
/// ambiguity between e.g. `("ab", "cd")` and `("abc", "d")`.
fn hash_fields(fields: &[&str]) -> blake3::Hash {
    let mut hasher = Hasher::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\x1f");
        }
        hasher.update(field.as_bytes());
    }
    hasher.finalize()
}

/// Computes the cache key component for a query: a 128-bit hex hash over
/// the normalized query text, tenant scope, and effective `top_k`.
pub fn hash_query(text: &str, tenant: Option<&str>, top_k: u32) -> String {
    let tenant = tenant.unwrap_or("");
    let top_k_str = top_k.to_string();
    let hash = hash_fields(&[text, tenant, &top_k_str]);
    let bytes = &hash.as_bytes()[0..16];
    let mut out = String::with_capacity(32);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// Computes a 128-bit hex hash over a single text value, used for the
/// `embed:<text_hash>:*` namespace key.
pub fn hash_text(text: &str) -> String {
    hash_to_hex128(text.as_bytes())
}

/// Composes the cache version tag from the three active identifiers that
/// govern cache validity: the embedding model id, the LTR model id, and the
/// weight set version. A cached entry whose stored tag doesn't match the
/// current tag is treated as a miss (see the cache layer's consistency
/// invariant).
pub fn version_tag(embedding_model_id: &str, ltr_model_id: &str, weight_set_version: u64) -> String {
    let weight_str = weight_set_version.to_string();
    let hash = hash_fields(&[embedding_model_id, ltr_model_id, &weight_str]);
    hash.to_hex().to_string()
}
