//! Pending proposal storage.

use indexmap::IndexMap;
use parking_lot::RwLock;
use quorum_types::{BlockHeight, BlockProposal, Hash, RejectReason, ValidatorId};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

/// How a submission changed the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The proposal is new. `replaced` names an earlier proposal from the
    /// same proposer at the same height that it displaced.
    Accepted { replaced: Option<Hash> },

    /// A proposal with this hash is already pending.
    AlreadyKnown,
}

#[derive(Debug, Default)]
struct Inner {
    by_hash: HashMap<Hash, BlockProposal>,
    /// Height -> proposer -> hash. One slot per proposer per height.
    slots: BTreeMap<BlockHeight, IndexMap<ValidatorId, Hash>>,
}

impl Inner {
    fn unlink(&mut self, proposal: &BlockProposal) {
        if let Some(slot) = self.slots.get_mut(&proposal.height) {
            if slot.get(&proposal.proposer) == Some(&proposal.block_hash) {
                slot.shift_remove(&proposal.proposer);
            }
            if slot.is_empty() {
                self.slots.remove(&proposal.height);
            }
        }
    }
}

/// Proposals awaiting quorum, indexed by hash and by height.
#[derive(Debug, Default)]
pub struct ProposalStore {
    inner: RwLock<Inner>,
}

impl ProposalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a proposal for voting.
    ///
    /// Rejects heights at or below `committed_height`. A second proposal
    /// from the same proposer at the same height replaces the first.
    pub fn submit(
        &self,
        proposal: BlockProposal,
        committed_height: BlockHeight,
    ) -> Result<SubmitOutcome, RejectReason> {
        if proposal.height <= committed_height {
            return Err(RejectReason::StaleHeight);
        }

        let mut inner = self.inner.write();
        if inner.by_hash.contains_key(&proposal.block_hash) {
            return Ok(SubmitOutcome::AlreadyKnown);
        }

        let replaced = inner
            .slots
            .entry(proposal.height)
            .or_default()
            .insert(proposal.proposer.clone(), proposal.block_hash);
        if let Some(old) = replaced {
            inner.by_hash.remove(&old);
            debug!(
                height = proposal.height.0,
                proposer = %proposal.proposer,
                old_hash = %old,
                new_hash = %proposal.block_hash,
                "Proposal replaced by same proposer"
            );
        }

        inner.by_hash.insert(proposal.block_hash, proposal);
        Ok(SubmitOutcome::Accepted { replaced })
    }

    /// Get a pending proposal by hash.
    pub fn get(&self, block_hash: &Hash) -> Option<BlockProposal> {
        self.inner.read().by_hash.get(block_hash).cloned()
    }

    /// Whether a proposal with this hash is pending.
    pub fn contains(&self, block_hash: &Hash) -> bool {
        self.inner.read().by_hash.contains_key(block_hash)
    }

    /// Remove a proposal by hash.
    pub fn evict(&self, block_hash: &Hash) -> Option<BlockProposal> {
        let mut inner = self.inner.write();
        let proposal = inner.by_hash.remove(block_hash)?;
        inner.unlink(&proposal);
        Some(proposal)
    }

    /// Remove every proposal strictly below `height`.
    pub fn evict_below(&self, height: BlockHeight) -> Vec<BlockProposal> {
        let mut inner = self.inner.write();
        let retained = inner.slots.split_off(&height);
        let dropped = std::mem::replace(&mut inner.slots, retained);

        dropped
            .into_values()
            .flat_map(|slot| slot.into_values())
            .filter_map(|hash| inner.by_hash.remove(&hash))
            .collect()
    }

    /// Proposals received more than `timeout` before `now`.
    pub fn expired(&self, now: Duration, timeout: Duration) -> Vec<BlockProposal> {
        self.inner
            .read()
            .by_hash
            .values()
            .filter(|proposal| now.saturating_sub(proposal.received_at) > timeout)
            .cloned()
            .collect()
    }

    /// Pending proposals at one height, in arrival order.
    pub fn at_height(&self, height: BlockHeight) -> Vec<BlockProposal> {
        let inner = self.inner.read();
        inner
            .slots
            .get(&height)
            .map(|slot| {
                slot.values()
                    .filter_map(|hash| inner.by_hash.get(hash).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Heights with at least one pending proposal, ascending.
    pub fn heights(&self) -> Vec<BlockHeight> {
        self.inner.read().slots.keys().copied().collect()
    }

    /// Number of pending proposals.
    pub fn len(&self) -> usize {
        self.inner.read().by_hash.len()
    }

    /// Whether no proposals are pending.
    pub fn is_empty(&self) -> bool {
        self.inner.read().by_hash.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_types::Signature;

    fn proposal(height: u64, proposer: &str, payload: &str) -> BlockProposal {
        BlockProposal::new(
            BlockHeight(height),
            ValidatorId::new(proposer),
            payload.as_bytes().to_vec(),
            Signature::empty(),
        )
    }

    #[test]
    fn test_submit_and_lookup() {
        let store = ProposalStore::new();
        let p = proposal(1, "alice", "txs");

        let outcome = store.submit(p.clone(), BlockHeight::GENESIS).unwrap();
        assert_eq!(outcome, SubmitOutcome::Accepted { replaced: None });
        assert_eq!(store.get(&p.block_hash), Some(p.clone()));
        assert!(store.contains(&p.block_hash));
        assert_eq!(store.heights(), vec![BlockHeight(1)]);
    }

    #[test]
    fn test_resubmit_is_already_known() {
        let store = ProposalStore::new();
        let p = proposal(1, "alice", "txs");

        store.submit(p.clone(), BlockHeight::GENESIS).unwrap();
        assert_eq!(
            store.submit(p, BlockHeight::GENESIS),
            Ok(SubmitOutcome::AlreadyKnown)
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_stale_height_rejected() {
        let store = ProposalStore::new();
        assert_eq!(
            store.submit(proposal(3, "alice", "txs"), BlockHeight(3)),
            Err(RejectReason::StaleHeight)
        );
        assert_eq!(
            store.submit(proposal(2, "alice", "txs"), BlockHeight(3)),
            Err(RejectReason::StaleHeight)
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_same_proposer_same_height_replaces() {
        let store = ProposalStore::new();
        let first = proposal(1, "alice", "one");
        let second = proposal(1, "alice", "two");

        store.submit(first.clone(), BlockHeight::GENESIS).unwrap();
        let outcome = store.submit(second.clone(), BlockHeight::GENESIS).unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Accepted {
                replaced: Some(first.block_hash)
            }
        );
        assert!(!store.contains(&first.block_hash));
        assert_eq!(store.at_height(BlockHeight(1)), vec![second]);
    }

    #[test]
    fn test_different_proposers_coexist() {
        let store = ProposalStore::new();
        let a = proposal(1, "alice", "same");
        let b = proposal(1, "bob", "same");

        store.submit(a.clone(), BlockHeight::GENESIS).unwrap();
        store.submit(b.clone(), BlockHeight::GENESIS).unwrap();

        assert_ne!(a.block_hash, b.block_hash);
        assert_eq!(store.at_height(BlockHeight(1)), vec![a, b]);
    }

    #[test]
    fn test_evict_below_keeps_higher_heights() {
        let store = ProposalStore::new();
        for height in 1..=4 {
            store
                .submit(proposal(height, "alice", "txs"), BlockHeight::GENESIS)
                .unwrap();
        }

        let dropped = store.evict_below(BlockHeight(3));
        let mut heights: Vec<_> = dropped.iter().map(|p| p.height.0).collect();
        heights.sort();

        assert_eq!(heights, vec![1, 2]);
        assert_eq!(store.heights(), vec![BlockHeight(3), BlockHeight(4)]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_evict_cleans_height_index() {
        let store = ProposalStore::new();
        let p = proposal(2, "alice", "txs");
        store.submit(p.clone(), BlockHeight::GENESIS).unwrap();

        assert_eq!(store.evict(&p.block_hash), Some(p.clone()));
        assert_eq!(store.evict(&p.block_hash), None);
        assert!(store.heights().is_empty());
    }

    #[test]
    fn test_expired_uses_received_at() {
        let store = ProposalStore::new();
        let mut old = proposal(1, "alice", "old");
        old.received_at = Duration::from_secs(1);
        let mut fresh = proposal(1, "bob", "fresh");
        fresh.received_at = Duration::from_secs(20);

        store.submit(old.clone(), BlockHeight::GENESIS).unwrap();
        store.submit(fresh, BlockHeight::GENESIS).unwrap();

        let expired = store.expired(Duration::from_secs(25), Duration::from_secs(10));
        assert_eq!(expired, vec![old]);
    }
}
