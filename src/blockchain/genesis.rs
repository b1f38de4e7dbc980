use chrono::Utc;
use log::debug;

use super::block::{Block, Entry};
use super::miner::Miner;
use super::{GENESIS_AUTHOR, GENESIS_DIFFICULTY, GENESIS_TEXT, ZERO_HASH};

/// Create and mine the genesis block (first block in the chain).
///
/// Genesis is always mined at `GENESIS_DIFFICULTY`, whatever the chain is
/// configured with, and the search has no iteration bound.
pub fn make_genesis() -> Block {
    let now = Utc::now().timestamp();
    let entry = Entry {
        author: GENESIS_AUTHOR.to_string(),
        text: GENESIS_TEXT.to_string(),
        timestamp: now,
    };
    let mut block = Block::new_with_timestamp(0, ZERO_HASH.to_string(), vec![entry], now);

    let miner = Miner {
        max_iterations: u64::MAX,
        ..Miner::default()
    };
    let outcome = miner.mine(&mut block, GENESIS_DIFFICULTY);
    debug!("genesis mined (nonce={})", outcome.nonce);
    block
}
