pub mod block;
pub mod error;
pub mod genesis;
pub mod hasher;
pub mod miner;
pub mod model;
pub mod validation;

pub use block::{Block, BlockRecord, Entry};
pub use error::DiaryError;
pub use genesis::make_genesis;
pub use miner::{Miner, MiningOutcome, mine};
pub use model::{Candidate, Chain, EntryMode};
pub use validation::{ValidationError, is_valid, validate_chain};

/// Default Proof-of-Work difficulty (number of leading hex zeros).
pub const DEFAULT_DIFFICULTY: u32 = 3;

/// Genesis is always mined at this difficulty, whatever the chain uses.
pub const GENESIS_DIFFICULTY: u32 = 2;

/// Difficulty bounds (keep low to avoid long waits)
pub const DIFF_MIN: u32 = 1;
pub const DIFF_MAX: u32 = 6;

/// Nonces tried at the requested difficulty before relaxing it by one.
pub const DEFAULT_MAX_ITERATIONS: u64 = 5_000_000;

/// Iterations between timestamp refreshes during a search.
pub const TIMESTAMP_REFRESH_INTERVAL: u64 = 100_000;

/// Length of a hex-encoded SHA-256 digest.
pub const HASH_HEX_LEN: u32 = 64;

/// `previous_hash` of every genesis block.
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

pub const GENESIS_AUTHOR: &str = "system";
pub const GENESIS_TEXT: &str = "genesis";

/// Author recorded when an entry is submitted without one.
pub const DEFAULT_AUTHOR: &str = "Student";

/* -------------------- Engine entry points -------------------- */

/// Fresh chain at the default difficulty, instant mode.
pub fn create_chain() -> Chain {
    Chain::default()
}

/// Mine `text` into a new block at `difficulty`, which also becomes the
/// chain's configured difficulty.
pub fn append_entry(
    chain: &mut Chain,
    author: &str,
    text: &str,
    difficulty: u32,
) -> Result<Block, DiaryError> {
    let entry = model::prepare_entry(author, text)?;
    chain.set_difficulty(difficulty)?;
    chain.append(entry).cloned()
}

pub fn validate(chain: &Chain) -> bool {
    chain.is_valid()
}

pub fn describe_block(block: &Block) -> BlockRecord {
    block.describe()
}
