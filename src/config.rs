//! Runtime configuration, read from the environment (and `.env` via dotenvy).

use log::warn;
use std::env;
use std::str::FromStr;

use crate::blockchain::model::check_difficulty;
use crate::blockchain::{DEFAULT_DIFFICULTY, DEFAULT_MAX_ITERATIONS, EntryMode, Miner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Difficulty new sessions start with.
    pub difficulty: u32,
    pub max_iterations: u64,
    pub mode: EntryMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            difficulty: DEFAULT_DIFFICULTY,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            mode: EntryMode::Instant,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults, unusable
    /// values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let difficulty = parse_or(&lookup, "DIARY_DIFFICULTY", defaults.difficulty);
        let difficulty = match check_difficulty(difficulty) {
            Ok(d) => d,
            Err(e) => {
                warn!("DIARY_DIFFICULTY ignored: {e}");
                defaults.difficulty
            }
        };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            difficulty,
            max_iterations: parse_or(&lookup, "DIARY_MAX_ITERATIONS", defaults.max_iterations),
            mode: parse_or(&lookup, "DIARY_MODE", defaults.mode),
        }
    }

    pub fn miner(&self) -> Miner {
        Miner::with_max_iterations(self.max_iterations)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{key}={raw:?} could not be parsed, using default");
            default
        }),
    }
}
