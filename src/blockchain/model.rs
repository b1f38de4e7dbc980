use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;

use super::error::{DiaryError, Result};
use super::genesis::make_genesis;
use super::miner::{Miner, MiningOutcome};
use super::validation::{self, ValidationError};
use super::{Block, DEFAULT_AUTHOR, DEFAULT_DIFFICULTY, DIFF_MAX, DIFF_MIN, Entry};

/// How entries become blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryMode {
    /// Every entry is mined into its own block right away.
    #[default]
    Instant,
    /// Entries are staged and sealed together on request.
    Batched,
}

impl fmt::Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryMode::Instant => f.write_str("instant"),
            EntryMode::Batched => f.write_str("batched"),
        }
    }
}

impl FromStr for EntryMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instant" => Ok(EntryMode::Instant),
            "batched" => Ok(EntryMode::Batched),
            other => Err(format!("unknown entry mode `{other}`")),
        }
    }
}

pub fn check_difficulty(difficulty: u32) -> Result<u32> {
    if (DIFF_MIN..=DIFF_MAX).contains(&difficulty) {
        Ok(difficulty)
    } else {
        Err(DiaryError::DifficultyOutOfRange {
            requested: difficulty,
            min: DIFF_MIN,
            max: DIFF_MAX,
        })
    }
}

/// Trim author/text, reject blank text and fall back to the placeholder author.
pub fn prepare_entry(author: &str, text: &str) -> Result<Entry> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DiaryError::EmptyEntry);
    }
    let author = match author.trim() {
        "" => DEFAULT_AUTHOR,
        a => a,
    };
    Ok(Entry::new(author, text))
}

/// In-memory diary chain with Proof-of-Work. Always holds at least genesis.
#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<Block>,
    pending: Vec<Entry>,
    difficulty: u32,
    mode: EntryMode,
    miner: Miner,
}

impl Default for Chain {
    fn default() -> Self {
        Self {
            blocks: vec![make_genesis()],
            pending: Vec::new(),
            difficulty: DEFAULT_DIFFICULTY,
            mode: EntryMode::default(),
            miner: Miner::default(),
        }
    }
}

impl Chain {
    /// Initialize a new chain with a mined genesis block.
    pub fn new(difficulty: u32, mode: EntryMode, miner: Miner) -> Result<Self> {
        let difficulty = check_difficulty(difficulty)?;
        Ok(Self {
            blocks: vec![make_genesis()],
            pending: Vec::new(),
            difficulty,
            mode,
            miner,
        })
    }

    /// Return the last block in the chain.
    pub fn tip(&self) -> &Block {
        // never empty: genesis is pushed in `new` and blocks are only appended
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn pending(&self) -> &[Entry] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn mode(&self) -> EntryMode {
        self.mode
    }

    /// Affects blocks mined from now on, and the difficulty `validate` checks against.
    pub fn set_difficulty(&mut self, difficulty: u32) -> Result<()> {
        self.difficulty = check_difficulty(difficulty)?;
        Ok(())
    }

    /// Seal a block holding any pending entries plus this one.
    pub fn append_entry(&mut self, author: &str, text: &str) -> Result<&Block> {
        let entry = prepare_entry(author, text)?;
        self.append(entry)
    }

    /// Seal an already prepared entry (plus any pending ones).
    pub fn append(&mut self, entry: Entry) -> Result<&Block> {
        let mut candidate = self.candidate_with(Some(entry));
        candidate.mine();
        self.commit(candidate)
    }

    /// Like `append_entry`, aborting when `cancel` is raised. The chain is left unchanged then.
    pub fn append_entry_until(
        &mut self,
        author: &str,
        text: &str,
        cancel: &AtomicBool,
    ) -> Result<&Block> {
        let mut candidate = self.begin_append(author, text)?;
        candidate.mine_until(cancel)?;
        self.commit(candidate)
    }

    /// Queue an entry for the next sealed block. Returns the number of pending entries.
    pub fn stage_entry(&mut self, author: &str, text: &str) -> Result<usize> {
        self.require_batched()?;
        let entry = prepare_entry(author, text)?;
        self.pending.push(entry);
        debug!("staged entry ({} pending)", self.pending.len());
        Ok(self.pending.len())
    }

    /// Mine every pending entry into one block.
    pub fn seal_pending(&mut self) -> Result<&Block> {
        let mut candidate = self.begin_seal()?;
        candidate.mine();
        self.commit(candidate)
    }

    pub fn seal_pending_until(&mut self, cancel: &AtomicBool) -> Result<&Block> {
        let mut candidate = self.begin_seal()?;
        candidate.mine_until(cancel)?;
        self.commit(candidate)
    }

    /// Candidate for `author`/`text` on top of the current tip. Mine it
    /// without holding the chain, then hand it to `commit`.
    pub fn begin_append(&self, author: &str, text: &str) -> Result<Candidate> {
        let entry = prepare_entry(author, text)?;
        Ok(self.candidate_with(Some(entry)))
    }

    /// Candidate sealing the entries pending right now (batched mode).
    pub fn begin_seal(&self) -> Result<Candidate> {
        self.require_batched()?;
        if self.pending.is_empty() {
            return Err(DiaryError::NothingPending);
        }
        Ok(self.candidate_with(None))
    }

    /// Append a mined candidate if it still extends the current tip.
    pub fn commit(&mut self, candidate: Candidate) -> Result<&Block> {
        let Candidate {
            block, sealed_pending, ..
        } = candidate;
        if block.index != self.blocks.len() as u64
            || block.previous_hash != self.tip().hash()
            || sealed_pending > self.pending.len()
            || block.payload[..sealed_pending] != self.pending[..sealed_pending]
        {
            return Err(DiaryError::StaleCandidate);
        }
        self.pending.drain(..sealed_pending);
        info!(
            "appended block #{} with {} entr{}",
            block.index,
            block.payload.len(),
            if block.payload.len() == 1 { "y" } else { "ies" }
        );
        self.blocks.push(block);
        Ok(self.tip())
    }

    /// Validate the entire chain: linkage and PoW.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        validation::validate_chain(&self.blocks, self.difficulty)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    fn require_batched(&self) -> Result<()> {
        match self.mode {
            EntryMode::Batched => Ok(()),
            mode => Err(DiaryError::ModeMismatch { mode }),
        }
    }

    fn candidate_with(&self, extra: Option<Entry>) -> Candidate {
        let sealed_pending = self.pending.len();
        let mut payload = self.pending.clone();
        payload.extend(extra);
        Candidate {
            block: Block::new(self.blocks.len() as u64, self.tip().hash(), payload),
            difficulty: self.difficulty,
            miner: self.miner,
            sealed_pending,
        }
    }
}

/// Block built from a snapshot of the chain, mined detached from it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub block: Block,
    pub difficulty: u32,
    miner: Miner,
    sealed_pending: usize,
}

impl Candidate {
    pub fn mine(&mut self) -> MiningOutcome {
        self.miner.mine(&mut self.block, self.difficulty)
    }

    pub fn mine_until(&mut self, cancel: &AtomicBool) -> Result<MiningOutcome> {
        self.miner
            .mine_until(&mut self.block, self.difficulty, cancel)
            .ok_or(DiaryError::MiningCancelled)
    }
}
