//! Stateless helpers for generated identifiers and payload decoding.

use uuid::Uuid;

use crate::config::CollectionsConfig;
use crate::error::{CollectionError, CollectionResult};

/// Fresh key for a collection produced by an algebra or copy operation.
pub fn derived_key(config: &CollectionsConfig) -> String {
    format!("{}{}", config.derived_key_prefix, Uuid::new_v4().simple())
}

/// Placeholder value that cannot collide with a caller's element in practice.
pub fn sentinel(config: &CollectionsConfig) -> String {
    format!("{}{}", config.sentinel_prefix, Uuid::new_v4().simple())
}

/// Fresh tree node id. Ids are never reused.
pub fn node_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Decode a stored payload as UTF-8 text.
pub fn decode(key: &str, raw: &[u8]) -> CollectionResult<String> {
    std::str::from_utf8(raw)
        .map(str::to_owned)
        .map_err(|e| CollectionError::Decode {
            key: key.to_string(),
            reason: e.to_string(),
        })
}
