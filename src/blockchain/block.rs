use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::hasher;

/// One diary entry sealed inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub author: String,
    pub text: String,
    pub timestamp: i64, // Unix timestamp (UTC)
}

impl Entry {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            timestamp: Utc::now().timestamp(),
        }
    }

    /// Sorted-key JSON object fed into the block preimage.
    pub(crate) fn canonical(&self) -> Value {
        json!({
            "author": self.author,
            "text": self.text,
            "timestamp": self.timestamp,
        })
    }
}

/// A single block in the diary chain.
///
/// There is no stored `hash` field: the hash is always derived from the
/// current field values, so mutating `nonce` or `timestamp` can never leave
/// a stale digest behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: i64, // Unix timestamp (UTC), advisory only
    pub previous_hash: String,
    pub nonce: u64, // Proof-of-Work nonce
    pub payload: Vec<Entry>,
}

impl Block {
    /// Create a new candidate block (not mined yet). Hand it to a `Miner` to perform PoW.
    pub fn new(index: u64, previous_hash: String, payload: Vec<Entry>) -> Self {
        Self::new_with_timestamp(index, previous_hash, payload, Utc::now().timestamp())
    }

    pub fn new_with_timestamp(
        index: u64,
        previous_hash: String,
        payload: Vec<Entry>,
        timestamp: i64,
    ) -> Self {
        Self {
            index,
            timestamp,
            previous_hash,
            nonce: 0,
            payload,
        }
    }

    /// SHA-256 over the canonical form of the block's current fields.
    pub fn hash(&self) -> String {
        hasher::digest(
            self.index,
            self.timestamp,
            &self.previous_hash,
            self.nonce,
            &self.payload,
        )
    }

    /// Whether the current hash carries `difficulty` leading hex zeros.
    /// (Does NOT check chain linkage.)
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        hasher::meets_difficulty(&self.hash(), difficulty)
    }

    pub fn describe(&self) -> BlockRecord {
        BlockRecord {
            index: self.index,
            timestamp: self.timestamp,
            previous_hash: self.previous_hash.clone(),
            hash: self.hash(),
            nonce: self.nonce,
            payload: self.payload.clone(),
        }
    }
}

/// Display/export view of a block, including its derived hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub index: u64,
    pub timestamp: i64,
    pub previous_hash: String,
    pub hash: String,
    pub nonce: u64,
    pub payload: Vec<Entry>,
}

#[cfg(test)]
mod tests {
    use super::{Block, Entry};

    fn sample() -> Block {
        let entry = Entry {
            author: "Ada".into(),
            text: "Learned proof of work".into(),
            timestamp: 1_700_000_000,
        };
        Block::new_with_timestamp(1, "ab".repeat(32), vec![entry], 1_700_000_000)
    }

    #[test]
    fn hash_is_deterministic() {
        let b = sample();
        assert_eq!(b.hash(), b.hash());
        assert_eq!(b.hash(), b.clone().hash());
    }

    #[test]
    fn nonce_changes_hash() {
        let mut b = sample();
        let before = b.hash();
        b.nonce += 1;
        assert_ne!(before, b.hash());
    }

    #[test]
    fn every_field_feeds_the_hash() {
        let base = sample().hash();

        let mut b = sample();
        b.timestamp += 1;
        assert_ne!(base, b.hash());

        let mut b = sample();
        b.index += 1;
        assert_ne!(base, b.hash());

        let mut b = sample();
        b.previous_hash = "cd".repeat(32);
        assert_ne!(base, b.hash());

        let mut b = sample();
        b.payload[0].text.push('!');
        assert_ne!(base, b.hash());
    }

    #[test]
    fn describe_exposes_derived_hash() {
        let b = sample();
        let record = b.describe();
        assert_eq!(record.index, 1);
        assert_eq!(record.hash, b.hash());
        assert_eq!(record.previous_hash, b.previous_hash);
        assert_eq!(record.payload, b.payload);
    }
}
