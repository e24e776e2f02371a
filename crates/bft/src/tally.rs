//! Per-block vote accumulation.
//!
//! Each block hash gets its own lock, so votes on unrelated blocks never
//! contend. The `committed` slot is the single compare-and-set point that
//! makes finalization happen exactly once per hash.
//!
//! A tally stores who voted, not how much each vote weighed. Power is
//! measured against the registry every time quorum is evaluated, so a voter
//! deactivated mid-round stops counting and a power update applies to
//! votes already cast.

use crate::registry::{ActivePower, ValidatorRegistry};
use dashmap::DashMap;
use indexmap::IndexSet;
use parking_lot::Mutex;
use quorum_types::{Hash, ValidatorId};
use std::sync::Arc;
use std::time::Duration;

/// Result of recording a single vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TallyResult {
    /// Current power of the active voters after this vote.
    pub current_power: u64,
    /// Number of active voters after this vote.
    pub voter_count: usize,
    /// Threshold the vote was evaluated against.
    pub quorum_power: u64,
    /// Whether `current_power` meets the threshold.
    pub reached: bool,
    /// False when the voter had already been counted.
    pub newly_added: bool,
    /// Whether the block was already committed before this vote.
    pub committed: bool,
}

/// Read-only view of a tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallySnapshot {
    /// Voters that count toward the block, in arrival order.
    pub voters: Vec<ValidatorId>,
    /// Summed power of `voters`.
    pub voting_power: u64,
    /// Threshold `voting_power` was measured against.
    pub quorum_power: u64,
    /// Whether the block has been committed.
    pub committed: bool,
}

impl TallySnapshot {
    fn from_power(power: ActivePower, committed: bool) -> Self {
        Self {
            quorum_power: power.quorum(),
            voting_power: power.voted,
            voters: power.counted,
            committed,
        }
    }
}

#[derive(Debug)]
struct RoundTally {
    /// Everyone who voted, active or not, in arrival order.
    voters: IndexSet<ValidatorId>,
    /// Power frozen at commit.
    committed: Option<ActivePower>,
    created_at: Duration,
}

impl RoundTally {
    fn new(created_at: Duration) -> Self {
        Self {
            voters: IndexSet::new(),
            committed: None,
            created_at,
        }
    }

    fn snapshot(&self, registry: &ValidatorRegistry) -> TallySnapshot {
        match &self.committed {
            Some(frozen) => TallySnapshot::from_power(frozen.clone(), true),
            None => TallySnapshot::from_power(registry.measure(&self.voters), false),
        }
    }
}

/// Vote tallies keyed by block hash.
#[derive(Debug, Default)]
pub struct VoteTally {
    tallies: DashMap<Hash, Arc<Mutex<RoundTally>>>,
}

impl VoteTally {
    /// Create an empty tally set.
    pub fn new() -> Self {
        Self::default()
    }

    fn tally(&self, block_hash: Hash, now: Duration) -> Arc<Mutex<RoundTally>> {
        // Clone the handle out so the shard lock is released before the
        // per-block lock is taken.
        Arc::clone(
            self.tallies
                .entry(block_hash)
                .or_insert_with(|| Arc::new(Mutex::new(RoundTally::new(now))))
                .value(),
        )
    }

    fn existing(&self, block_hash: &Hash) -> Option<Arc<Mutex<RoundTally>>> {
        self.tallies
            .get(block_hash)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Record a vote and evaluate the block against the live validator set.
    ///
    /// Duplicate voters leave the tally unchanged. Votes for a committed
    /// block are not added and report the power frozen at commit.
    pub fn record_vote(
        &self,
        block_hash: Hash,
        voter: ValidatorId,
        registry: &ValidatorRegistry,
        now: Duration,
    ) -> TallyResult {
        let tally = self.tally(block_hash, now);
        let mut state = tally.lock();

        let committed = state.committed.is_some();
        let newly_added = !committed && state.voters.insert(voter);
        let power = match &state.committed {
            Some(frozen) => frozen.clone(),
            None => registry.measure(&state.voters),
        };

        TallyResult {
            current_power: power.voted,
            voter_count: power.counted.len(),
            quorum_power: power.quorum(),
            reached: power.reached(),
            newly_added,
            committed,
        }
    }

    /// Atomically mark a block committed if it holds quorum right now.
    ///
    /// Quorum is re-measured under the block's lock. Exactly one caller gets
    /// the frozen set of active voters; every other caller, a tally short of
    /// quorum or an unknown hash gets `None`.
    pub fn try_commit(
        &self,
        block_hash: &Hash,
        registry: &ValidatorRegistry,
    ) -> Option<TallySnapshot> {
        let tally = self.existing(block_hash)?;
        let mut state = tally.lock();
        if state.committed.is_some() {
            return None;
        }
        let power = registry.measure(&state.voters);
        if !power.reached() {
            return None;
        }
        state.committed = Some(power.clone());
        Some(TallySnapshot::from_power(power, true))
    }

    /// Whether the block has been committed.
    pub fn is_committed(&self, block_hash: &Hash) -> bool {
        self.existing(block_hash)
            .is_some_and(|tally| tally.lock().committed.is_some())
    }

    /// Current state of a block's tally, measured against `registry`
    /// unless the block is committed.
    pub fn get(&self, block_hash: &Hash, registry: &ValidatorRegistry) -> Option<TallySnapshot> {
        self.existing(block_hash)
            .map(|tally| tally.lock().snapshot(registry))
    }

    /// Drop a block's tally.
    pub fn remove(&self, block_hash: &Hash) -> bool {
        self.tallies.remove(block_hash).is_some()
    }

    /// Uncommitted tallies created more than `timeout` before `now`.
    pub fn expired(&self, now: Duration, timeout: Duration) -> Vec<Hash> {
        self.tallies
            .iter()
            .filter(|entry| {
                let state = entry.value().lock();
                state.committed.is_none() && now.saturating_sub(state.created_at) > timeout
            })
            .map(|entry| *entry.key())
            .collect()
    }

    /// Number of tracked tallies.
    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    /// Whether no tallies are tracked.
    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }
}
