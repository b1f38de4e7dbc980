use thiserror::Error;

use super::block::Block;
use super::hasher::meets_difficulty;
use super::{GENESIS_DIFFICULTY, ZERO_HASH};

/// First rule a chain breaks, with the position where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("chain is empty")]
    EmptyChain,

    #[error("genesis does not reference the zero hash")]
    GenesisLink,

    #[error("genesis hash does not meet the genesis difficulty")]
    GenesisWork,

    #[error("block #{index} does not reference the hash of its predecessor")]
    BrokenLink { index: usize },

    #[error("block #{index} hash lacks {required} leading zeros")]
    InsufficientWork { index: usize, required: u32 },
}

impl ValidationError {
    /// Position of the failing block, if the failure is tied to one.
    pub fn index(&self) -> Option<usize> {
        match self {
            ValidationError::EmptyChain => None,
            ValidationError::GenesisLink | ValidationError::GenesisWork => Some(0),
            ValidationError::BrokenLink { index }
            | ValidationError::InsufficientWork { index, .. } => Some(*index),
        }
    }
}

/// Walk the chain checking linkage and PoW, stopping at the first failure.
/// Hashes are recomputed from the blocks' current fields.
pub fn validate_chain(chain: &[Block], difficulty: u32) -> Result<(), ValidationError> {
    let genesis = chain.first().ok_or(ValidationError::EmptyChain)?;
    if genesis.previous_hash != ZERO_HASH {
        return Err(ValidationError::GenesisLink);
    }
    let mut prev_hash = genesis.hash();
    if !meets_difficulty(&prev_hash, GENESIS_DIFFICULTY) {
        return Err(ValidationError::GenesisWork);
    }

    for (index, block) in chain.iter().enumerate().skip(1) {
        if block.previous_hash != prev_hash {
            return Err(ValidationError::BrokenLink { index });
        }
        let hash = block.hash();
        if !meets_difficulty(&hash, difficulty) {
            return Err(ValidationError::InsufficientWork {
                index,
                required: difficulty,
            });
        }
        prev_hash = hash;
    }

    Ok(())
}

pub fn is_valid(chain: &[Block], difficulty: u32) -> bool {
    validate_chain(chain, difficulty).is_ok()
}
