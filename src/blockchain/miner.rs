use chrono::Utc;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};

use super::block::Block;
use super::hasher::meets_difficulty;
use super::{DEFAULT_MAX_ITERATIONS, DIFF_MIN, HASH_HEX_LEN, TIMESTAMP_REFRESH_INTERVAL};

/// Result of a finished PoW search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningOutcome {
    pub hash: String,
    pub nonce: u64,
    pub iterations: u64,
    /// Difficulty the accepted hash was searched against.
    pub target_difficulty: u32,
    /// Set when the bounded phase ran out and the relaxed target was used.
    pub relaxed: bool,
}

/// Nonce search with a bounded phase at the requested difficulty followed by
/// an unbounded phase at `max(difficulty - 1, 1)`.
#[derive(Debug, Clone, Copy)]
pub struct Miner {
    pub max_iterations: u64,
    pub refresh_interval: u64,
    pub clock: fn() -> i64,
}

impl Default for Miner {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            refresh_interval: TIMESTAMP_REFRESH_INTERVAL,
            clock: wall_clock,
        }
    }
}

fn wall_clock() -> i64 {
    Utc::now().timestamp()
}

/// A digest has only `HASH_HEX_LEN` characters, so no target may ask for more zeros.
fn primary_target(difficulty: u32) -> u32 {
    difficulty.min(HASH_HEX_LEN)
}

fn relaxed_target(difficulty: u32) -> u32 {
    primary_target(difficulty).saturating_sub(1).max(DIFF_MIN)
}

impl Miner {
    pub fn with_max_iterations(max_iterations: u64) -> Self {
        Self {
            max_iterations,
            ..Self::default()
        }
    }

    /// Mine `candidate` in place. Always terminates with an accepted hash
    /// (almost surely; the relaxed phase has no bound).
    pub fn mine(&self, candidate: &mut Block, difficulty: u32) -> MiningOutcome {
        match self.search(candidate, difficulty, || false) {
            Some(outcome) => outcome,
            None => unreachable!("search without a stop signal never gives up"),
        }
    }

    /// Same policy as `mine`, but gives up as soon as `cancel` is raised.
    /// The candidate may have been mutated when this returns `None`.
    pub fn mine_until(
        &self,
        candidate: &mut Block,
        difficulty: u32,
        cancel: &AtomicBool,
    ) -> Option<MiningOutcome> {
        self.search(candidate, difficulty, || cancel.load(Ordering::Relaxed))
    }

    fn search<F>(
        &self,
        candidate: &mut Block,
        difficulty: u32,
        mut stopped: F,
    ) -> Option<MiningOutcome>
    where
        F: FnMut() -> bool,
    {
        let target = primary_target(difficulty);
        if target != difficulty {
            warn!("difficulty {difficulty} exceeds the digest length, searching at {target}");
        }
        candidate.nonce = 0;
        let mut iterations: u64 = 0;

        while iterations < self.max_iterations {
            if stopped() {
                debug!("mining of block #{} cancelled", candidate.index);
                return None;
            }
            let hash = candidate.hash();
            if meets_difficulty(&hash, target) {
                return Some(self.accept(candidate, hash, iterations, target, false));
            }
            self.step(candidate, &mut iterations);
        }

        let relaxed = relaxed_target(difficulty);
        warn!(
            "block #{} not sealed at difficulty {} within {} iterations; relaxing to {}",
            candidate.index, target, self.max_iterations, relaxed
        );

        loop {
            if stopped() {
                debug!("mining of block #{} cancelled", candidate.index);
                return None;
            }
            let hash = candidate.hash();
            if meets_difficulty(&hash, relaxed) {
                return Some(self.accept(candidate, hash, iterations, relaxed, true));
            }
            self.step(candidate, &mut iterations);
        }
    }

    fn step(&self, candidate: &mut Block, iterations: &mut u64) {
        candidate.nonce = candidate.nonce.wrapping_add(1);
        *iterations += 1;
        if self.refresh_interval > 0 && *iterations % self.refresh_interval == 0 {
            candidate.timestamp = (self.clock)();
            debug!(
                "mining block #{}: nonce {} reached, timestamp refreshed to {}",
                candidate.index, candidate.nonce, candidate.timestamp
            );
        }
    }

    fn accept(
        &self,
        candidate: &Block,
        hash: String,
        iterations: u64,
        target_difficulty: u32,
        relaxed: bool,
    ) -> MiningOutcome {
        info!(
            "sealed block #{} (hash={}, nonce={}, iterations={})",
            candidate.index, hash, candidate.nonce, iterations
        );
        MiningOutcome {
            hash,
            nonce: candidate.nonce,
            iterations,
            target_difficulty,
            relaxed,
        }
    }
}

/// Mine with the default refresh policy and the given iteration budget,
/// returning the accepted hash.
pub fn mine(candidate: &mut Block, difficulty: u32, max_iterations: u64) -> String {
    Miner::with_max_iterations(max_iterations)
        .mine(candidate, difficulty)
        .hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::block::Entry;

    fn candidate() -> Block {
        let entry = Entry {
            author: "Ada".into(),
            text: "Learned proof of work".into(),
            timestamp: 1_700_000_000,
        };
        Block::new_with_timestamp(1, "ab".repeat(32), vec![entry], 1_700_000_000)
    }

    fn fixed_clock() -> i64 {
        42
    }

    #[test]
    fn mining_produces_leading_zeros() {
        let mut b = candidate();
        let hash = mine(&mut b, 2, DEFAULT_MAX_ITERATIONS);
        assert!(hash.starts_with("00"));
        assert_eq!(hash, b.hash());
        assert!(b.meets_difficulty(2));
    }

    #[test]
    fn mining_at_three_returns_primary_or_fallback() {
        let mut b = candidate();
        let hash = mine(&mut b, 3, 5_000_000);
        assert!(hash.starts_with("00"));
    }

    #[test]
    fn mining_does_not_touch_identity_fields() {
        let mut b = candidate();
        let before = b.clone();
        Miner::default().mine(&mut b, 2);
        assert_eq!(b.index, before.index);
        assert_eq!(b.previous_hash, before.previous_hash);
        assert_eq!(b.payload, before.payload);
    }

    #[test]
    fn nonce_restarts_from_zero() {
        let mut b = candidate();
        b.nonce = 999_999;
        let outcome = Miner::default().mine(&mut b, 1);
        assert_eq!(outcome.nonce, outcome.iterations);
    }

    #[test]
    fn exhausted_budget_falls_back_one_level() {
        let mut b = candidate();
        let outcome = Miner::with_max_iterations(0).mine(&mut b, 2);
        assert!(outcome.relaxed);
        assert_eq!(outcome.target_difficulty, 1);
        assert!(outcome.hash.starts_with('0'));
        assert_eq!(outcome.hash, b.hash());
    }

    #[test]
    fn fallback_never_drops_below_one() {
        let mut b = candidate();
        let outcome = Miner::with_max_iterations(0).mine(&mut b, 1);
        assert!(outcome.relaxed);
        assert_eq!(outcome.target_difficulty, 1);
        assert!(outcome.hash.starts_with('0'));
    }

    fn refreshing_every(refresh_interval: u64) -> Miner {
        Miner {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            refresh_interval,
            clock: fixed_clock,
        }
    }

    #[test]
    fn default_refresh_interval_is_100_000() {
        assert_eq!(TIMESTAMP_REFRESH_INTERVAL, 100_000);
        assert_eq!(Miner::default().refresh_interval, TIMESTAMP_REFRESH_INTERVAL);
    }

    #[test]
    fn timestamp_only_moves_on_interval_boundaries() {
        let miner = refreshing_every(3);
        let mut b = candidate();
        let mut iterations = 0;

        miner.step(&mut b, &mut iterations);
        miner.step(&mut b, &mut iterations);
        assert_eq!(b.timestamp, 1_700_000_000);
        assert_eq!(b.nonce, 2);

        miner.step(&mut b, &mut iterations);
        assert_eq!(b.timestamp, 42);
        assert_eq!(b.nonce, 3);
    }

    #[test]
    fn search_refreshes_timestamp_after_first_interval() {
        // the digest cannot carry 64 zeros in practice, so the stop signal decides the length
        let miner = refreshing_every(3);

        let mut b = candidate();
        let mut checks = 0;
        let stopped_early = miner.search(&mut b, HASH_HEX_LEN, || {
            checks += 1;
            checks > 2
        });
        assert!(stopped_early.is_none());
        assert_eq!(b.nonce, 2);
        assert_eq!(b.timestamp, 1_700_000_000);

        let mut b = candidate();
        let mut checks = 0;
        let stopped_late = miner.search(&mut b, HASH_HEX_LEN, || {
            checks += 1;
            checks > 4
        });
        assert!(stopped_late.is_none());
        assert_eq!(b.nonce, 4);
        assert_eq!(b.timestamp, 42);
    }

    #[test]
    fn targets_never_exceed_the_digest_length() {
        assert_eq!(primary_target(66), HASH_HEX_LEN);
        assert_eq!(relaxed_target(66), HASH_HEX_LEN - 1);
        assert_eq!(primary_target(3), 3);
        assert_eq!(relaxed_target(3), 2);
        assert_eq!(relaxed_target(1), 1);
        assert_eq!(relaxed_target(0), 1);
    }

    #[test]
    fn raised_cancel_flag_stops_search() {
        let mut b = candidate();
        let cancel = AtomicBool::new(true);
        assert!(Miner::default().mine_until(&mut b, 6, &cancel).is_none());
    }

    #[test]
    fn lowered_cancel_flag_mines_normally() {
        let mut b = candidate();
        let cancel = AtomicBool::new(false);
        let outcome = Miner::default()
            .mine_until(&mut b, 2, &cancel)
            .expect("not cancelled");
        assert!(outcome.hash.starts_with("00"));
    }
}
