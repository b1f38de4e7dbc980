use thiserror::Error;

use super::model::EntryMode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiaryError {
    #[error("entry text must not be empty")]
    EmptyEntry,

    #[error("difficulty {requested} out of range ({min}..={max})")]
    DifficultyOutOfRange { requested: u32, min: u32, max: u32 },

    #[error("operation not available in {mode} mode")]
    ModeMismatch { mode: EntryMode },

    #[error("no pending entries to seal")]
    NothingPending,

    #[error("mining was cancelled")]
    MiningCancelled,

    #[error("chain moved on while the block was being mined")]
    StaleCandidate,
}

pub type Result<T> = std::result::Result<T, DiaryError>;
