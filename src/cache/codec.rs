//! Codecs for the two cache encodings: JSON for query responses and
//! feature vectors, a compact binary format (`rkyv`) for raw embeddings.

use rkyv::rancor::Error as RancorError;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::CacheError;

/// JSON codec, used for the `query:*` and `feat:*` namespaces.
pub struct JsonCodec;

impl JsonCodec {
    /// Serializes `value` to JSON bytes.
    pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CacheError> {
        Ok(serde_json::to_vec(value)?)
    }

    /// Deserializes JSON bytes into `T`.
    pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CacheError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Compact binary codec, used for the `embed:*` namespace (raw `f32` vectors).
pub struct BinaryCodec;

impl BinaryCodec {
    /// Serializes an embedding vector to its `rkyv` archived byte representation.
    pub fn encode(vector: &[f32]) -> Result<Vec<u8>, CacheError> {
        let owned = vector.to_vec();
        rkyv::to_bytes::<RancorError>(&owned)
            .map(|bytes| bytes.to_vec())
            .map_err(|e| CacheError::Binary {
                reason: e.to_string(),
            })
    }

    /// Deserializes an embedding vector from its `rkyv` archived byte representation.
    pub fn decode(bytes: &[u8]) -> Result<Vec<f32>, CacheError> {
        rkyv::from_bytes::<Vec<f32>, RancorError>(bytes).map_err(|e| CacheError::Binary {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trips_a_vector_of_strings() {
        let value = vec!["alpha".to_string(), "beta".to_string()];
        let bytes = JsonCodec::encode(&value).unwrap();
        let decoded: Vec<String> = JsonCodec::decode(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn binary_round_trips_an_embedding() {
        let vector: Vec<f32> = (0..384).map(|i| i as f32 * 0.01).collect();
        let bytes = BinaryCodec::encode(&vector).unwrap();
        let decoded = BinaryCodec::decode(&bytes).unwrap();
        assert_eq!(decoded, vector);
    }

    #[test]
    fn binary_decode_of_garbage_is_an_error() {
        let garbage = vec![0xffu8; 3];
        assert!(BinaryCodec::decode(&garbage).is_err());
    }
}
