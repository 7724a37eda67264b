//! Cache key definitions.
//!
//! Keys are plain strings scoped by namespace so one resource's purge never touches another's:
//!
//! - `{namespace}:item:{id}`
//! - `{namespace}:list:{page}:{limit}:{hash}` (scan invalidation)
//! - `{namespace}:list:g{generation}:{page}:{limit}:{hash}` (generation invalidation)
//! - `{namespace}:gen`

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

pub fn item_key(namespace: &str, id: &str) -> String {
    format!("{namespace}:item:{id}")
}

pub fn list_key(namespace: &str, generation: Option<u64>, page: u32, limit: u32, hash: &str) -> String {
    match generation {
        Some(generation) => format!("{namespace}:list:g{generation}:{page}:{limit}:{hash}"),
        None => format!("{namespace}:list:{page}:{limit}:{hash}"),
    }
}

/// Prefix covering every list page of a namespace, whatever its generation.
pub fn list_prefix(namespace: &str) -> String {
    format!("{namespace}:list:")
}

pub fn generation_key(namespace: &str) -> String {
    format!("{namespace}:gen")
}

/// Hex SHA-256 of the canonical JSON form of `params`.
///
/// Object keys are emitted in sorted order and `null` members are dropped, so two parameter
/// sets that differ only in ordering or in absent filters hash identically.
pub fn hash_params<T: Serialize + ?Sized>(params: &T) -> Result<String, serde_json::Error> {
    let value = canonicalize(serde_json::to_value(params)?);
    let encoded = serde_json::to_vec(&value)?;
    Ok(hex::encode(Sha256::digest(&encoded)))
}

fn canonicalize(value: Value) -> Value {
    match value {
        // serde_json's default map is ordered by key, so rebuilding it sorts the members.
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, member)| !member.is_null())
                .map(|(key, member)| (key, canonicalize(member)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
