//! Canonical form and content fingerprint of a document.
//!
//! Canonicalization sorts object keys (byte-wise) at every level and keeps
//! array order; the canonical tree is written as compact JSON and hashed
//! with SHA-256. Key insertion order never affects the result.

use crate::card::{AgentCard, Fingerprint};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Rewrite `value` with object keys in sorted order at every depth.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            Value::Object(sorted)
        }
        scalar => scalar.clone(),
    }
}

/// Compact JSON encoding of the canonical form.
pub fn canonical_bytes(value: &Value) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(&canonicalize(value))
}

pub fn fingerprint_value(value: &Value) -> serde_json::Result<Fingerprint> {
    let bytes = canonical_bytes(value)?;
    let digest = Sha256::digest(&bytes);
    Ok(Fingerprint(hex::encode(digest)))
}

pub fn fingerprint_card(card: &AgentCard) -> serde_json::Result<Fingerprint> {
    fingerprint_value(&serde_json::to_value(card)?)
}
