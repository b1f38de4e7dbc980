use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use super::block::Entry;

/// Canonical preimage of a block: compact JSON with keys in lexicographic order.
///
/// `serde_json::Map` is a `BTreeMap` (no `preserve_order`), so nested objects
/// come out sorted as well and the same logical block always yields the same bytes.
pub fn canonical_preimage(
    index: u64,
    timestamp: i64,
    previous_hash: &str,
    nonce: u64,
    payload: &[Entry],
) -> String {
    let entries: Vec<Value> = payload.iter().map(Entry::canonical).collect();
    let preimage = json!({
        "index": index,
        "nonce": nonce,
        "payload": entries,
        "previous_hash": previous_hash,
        "timestamp": timestamp,
    });
    preimage.to_string()
}

/// SHA-256 of the canonical preimage as 64 lowercase hex characters.
pub fn digest(
    index: u64,
    timestamp: i64,
    previous_hash: &str,
    nonce: u64,
    payload: &[Entry],
) -> String {
    let preimage = canonical_preimage(index, timestamp, previous_hash, nonce, payload);
    let mut hasher = Sha256::new();
    hasher.update(preimage.as_bytes());
    hex::encode(hasher.finalize())
}

/// True when `hash` starts with `difficulty` hex zero characters.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let required = difficulty as usize;
    hash.len() >= required && hash.bytes().take(required).all(|b| b == b'0')
}
