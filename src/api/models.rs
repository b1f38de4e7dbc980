use crate::blockchain::{BlockRecord, Candidate, Chain, DiaryError, Entry, EntryMode};
use crate::config::Config;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use uuid::Uuid;

use super::errors::ApiError;

/// One diary session: a chain guarded by a single exclusive lock, plus the
/// flag that aborts mining when the session is dropped.
pub struct Session {
    chain: Mutex<Chain>,
    pub cancel: AtomicBool,
}

impl Session {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain: Mutex::new(chain),
            cancel: AtomicBool::new(false),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Chain> {
        self.chain.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build a candidate under the lock, mine it with the lock released and
    /// commit it. Starts over when another request moved the tip meanwhile.
    pub fn mine_detached<F>(&self, build: F) -> Result<BlockRecord, DiaryError>
    where
        F: Fn(&Chain) -> Result<Candidate, DiaryError>,
    {
        loop {
            let mut candidate = build(&self.lock())?;
            candidate.mine_until(&self.cancel)?;
            match self.lock().commit(candidate) {
                Ok(block) => return Ok(block.describe()),
                Err(DiaryError::StaleCandidate) => debug!("tip moved while mining, retrying"),
                Err(e) => return Err(e),
            }
        }
    }
}

/// Shared application state: configuration and the live sessions.
pub struct AppState {
    pub config: Config,
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, chain: Chain) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Session::new(chain)));
        id
    }

    pub fn session(&self, id: Uuid) -> Result<Arc<Session>, ApiError> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(ApiError::SessionNotFound(id))
    }

    pub fn remove(&self, id: Uuid) -> Result<Arc<Session>, ApiError> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .ok_or(ApiError::SessionNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/* ---------- Session API Models ---------- */

#[derive(Deserialize, Default)]
pub struct NewSessionRequest {
    pub difficulty: Option<u32>,
    pub mode: Option<EntryMode>,
}

#[derive(Serialize)]
pub struct NewSessionResponse {
    pub session_id: Uuid,
    pub difficulty: u32,
    pub mode: EntryMode,
    pub genesis: BlockRecord,
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse {
    pub length: usize,
    pub difficulty: u32,
    pub mode: EntryMode,
    /// Newest first.
    pub blocks: Vec<BlockRecord>,
    pub pending: Vec<Entry>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
    pub failed_index: Option<usize>,
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct DifficultyResponse {
    pub difficulty: u32,
}

#[derive(Deserialize)]
pub struct SetDifficultyRequest {
    pub difficulty: u32,
}

/* ---------- Entry API Models ---------- */

#[derive(Deserialize)]
pub struct EntryRequest {
    #[serde(default)]
    pub author: String,
    pub text: String,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EntryResponse {
    Sealed { block: BlockRecord },
    Staged { pending: usize },
}
