//! Consensus engine.
//!
//! # Round lifecycle
//!
//! ```text
//! IDLE ──proposal──► VOTING ──quorum──► COMMITTED (height advances)
//!                      │
//!                      └──round timeout──► evicted
//! ```
//!
//! The engine performs no I/O. Every operation returns a [`Handled`] value
//! whose actions (peer broadcasts, observer events) the runner executes.
//! All methods take `&self` and may be called from concurrent handlers.

use crate::{
    ConsensusConfig, ConsensusError, ProposalStore, SubmitOutcome, ValidatorRegistry, VoteTally,
};
use indexmap::IndexMap;
use parking_lot::RwLock;
use quorum_core::{
    Action, Clock, ConsensusEvent, Handled, OpaqueSignatures, OutboundMessage, SignatureVerifier,
    SystemClock,
};
use quorum_messages::{CastVoteRequest, ProposeBlockRequest};
use quorum_types::{BlockHeight, BlockProposal, Hash, Validator, ValidatorId, Vote};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Result of accepting a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// The proposal is new and entered voting.
    Accepted { height: BlockHeight, block_hash: Hash },

    /// The proposal was already pending or finalized; nothing changed.
    AlreadyKnown { height: BlockHeight, block_hash: Hash },
}

impl ProposalOutcome {
    /// Height of the proposal.
    pub fn height(&self) -> BlockHeight {
        match self {
            ProposalOutcome::Accepted { height, .. } | ProposalOutcome::AlreadyKnown { height, .. } => {
                *height
            }
        }
    }

    /// Hash of the proposal.
    pub fn block_hash(&self) -> Hash {
        match self {
            ProposalOutcome::Accepted { block_hash, .. }
            | ProposalOutcome::AlreadyKnown { block_hash, .. } => *block_hash,
        }
    }
}

/// Result of counting a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The block has not finalized yet.
    Pending {
        votes: usize,
        voting_power: u64,
        quorum_needed: u64,
    },

    /// The block is finalized, by this vote or an earlier one.
    Finalized {
        height: BlockHeight,
        votes: usize,
        voting_power: u64,
        quorum_needed: u64,
    },
}

impl VoteOutcome {
    /// Whether the block is finalized.
    pub fn is_finalized(&self) -> bool {
        matches!(self, VoteOutcome::Finalized { .. })
    }
}

/// A committed block, as remembered by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedBlock {
    pub height: BlockHeight,
    pub block_hash: Hash,
    pub proposer: ValidatorId,
    pub voters: Vec<ValidatorId>,
    pub voting_power: u64,
    /// Threshold in force when the block committed.
    pub quorum_needed: u64,
}

/// Point-in-time summary of consensus state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsensusState {
    pub current_height: BlockHeight,
    pub validator_count: usize,
    pub total_power: u64,
    pub quorum_threshold: u64,
    pub pending_proposals: usize,
}

#[derive(Debug, Default)]
struct Chain {
    /// Height of the last finalized block.
    current_height: BlockHeight,
    /// Recently finalized blocks, oldest first.
    finalized: IndexMap<Hash, FinalizedBlock>,
}

/// Round-based voting consensus.
pub struct ConsensusEngine {
    config: ConsensusConfig,
    registry: Arc<ValidatorRegistry>,
    proposals: Arc<ProposalStore>,
    tally: Arc<VoteTally>,
    clock: Arc<dyn Clock>,
    verifier: Arc<dyn SignatureVerifier>,
    chain: RwLock<Chain>,
}

impl std::fmt::Debug for ConsensusEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsensusEngine")
            .field("config", &self.config)
            .field("current_height", &self.current_height())
            .field("pending_proposals", &self.proposals.len())
            .finish()
    }
}

impl ConsensusEngine {
    /// Create an engine over a validator registry.
    ///
    /// Uses the system clock and treats signatures as opaque.
    pub fn new(config: ConsensusConfig, registry: Arc<ValidatorRegistry>) -> Self {
        Self {
            config,
            registry,
            proposals: Arc::new(ProposalStore::new()),
            tally: Arc::new(VoteTally::new()),
            clock: Arc::new(SystemClock::new()),
            verifier: Arc::new(OpaqueSignatures),
            chain: RwLock::new(Chain::default()),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the signature verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════════

    /// Engine configuration.
    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// The validator registry.
    pub fn registry(&self) -> &Arc<ValidatorRegistry> {
        &self.registry
    }

    /// Pending proposals.
    pub fn proposals(&self) -> &Arc<ProposalStore> {
        &self.proposals
    }

    /// Vote tallies.
    pub fn tally(&self) -> &Arc<VoteTally> {
        &self.tally
    }

    /// Height of the last finalized block.
    pub fn current_height(&self) -> BlockHeight {
        self.chain.read().current_height
    }

    /// Summary of consensus state.
    pub fn state(&self) -> ConsensusState {
        ConsensusState {
            current_height: self.current_height(),
            validator_count: self.registry.active_count(),
            total_power: self.registry.total_active_power(),
            quorum_threshold: self.registry.quorum_threshold(),
            pending_proposals: self.proposals.len(),
        }
    }

    /// A pending proposal by hash.
    pub fn proposal(&self, block_hash: &Hash) -> Option<BlockProposal> {
        self.proposals.get(block_hash)
    }

    /// A finalized block by hash, while it remains in history.
    pub fn finalized(&self, block_hash: &Hash) -> Option<FinalizedBlock> {
        self.chain.read().finalized.get(block_hash).cloned()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Validator Set
    // ═══════════════════════════════════════════════════════════════════════════

    /// Add or update a validator.
    pub fn register_validator(
        &self,
        id: ValidatorId,
        voting_power: u64,
    ) -> Result<Validator, ConsensusError> {
        Ok(self.registry.register(id, voting_power)?)
    }

    /// Deactivate a validator. Returns true if it was active.
    pub fn deactivate_validator(&self, id: &ValidatorId) -> bool {
        self.registry.deactivate(id)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Proposal Handling
    // ═══════════════════════════════════════════════════════════════════════════

    /// Accept a block proposal into voting.
    ///
    /// A new proposal is broadcast to peers and, if this node is an active
    /// validator, voted for immediately. Known proposals are acknowledged
    /// without side effects so that gossip terminates.
    pub fn handle_proposal(
        &self,
        mut proposal: BlockProposal,
    ) -> Result<Handled<ProposalOutcome>, ConsensusError> {
        let height = proposal.height;
        let block_hash = proposal.block_hash;

        if !self.registry.is_active(&proposal.proposer) {
            warn!(
                proposer = %proposal.proposer,
                height = height.0,
                "Proposal from non-validator rejected"
            );
            return Err(ConsensusError::NotAValidator(proposal.proposer));
        }

        if !proposal.hash_matches_payload() {
            return Err(ConsensusError::MalformedRequest(
                "block hash does not match payload".to_string(),
            ));
        }

        if !self.verifier.verify_proposal(&proposal) {
            warn!(
                proposer = %proposal.proposer,
                block_hash = %block_hash,
                "Proposal signature rejected"
            );
            return Err(ConsensusError::InvalidSignature(proposal.proposer));
        }

        proposal.received_at = self.clock.now();

        let submitted = {
            // Read lock pins the committed height for the stale check.
            let chain = self.chain.read();
            if let Some(block) = chain.finalized.get(&block_hash) {
                if block.height == height {
                    Ok(SubmitOutcome::AlreadyKnown)
                } else {
                    Err(ConsensusError::StaleHeight {
                        height,
                        committed: chain.current_height,
                    })
                }
            } else {
                self.proposals
                    .submit(proposal.clone(), chain.current_height)
                    .map_err(|_| ConsensusError::StaleHeight {
                        height,
                        committed: chain.current_height,
                    })
            }
        };

        let replaced = match submitted? {
            SubmitOutcome::AlreadyKnown => {
                trace!(block_hash = %block_hash, "Proposal already known");
                return Ok(Handled::quiet(ProposalOutcome::AlreadyKnown {
                    height,
                    block_hash,
                }));
            }
            SubmitOutcome::Accepted { replaced } => replaced,
        };

        if let Some(old) = replaced {
            self.tally.remove(&old);
        }
        self.registry.record_proposal(&proposal.proposer);

        info!(
            height = height.0,
            block_hash = %block_hash,
            proposer = %proposal.proposer,
            "Proposal accepted"
        );

        let mut actions = vec![
            Action::Broadcast(OutboundMessage::Proposal(
                ProposeBlockRequest::from_proposal(&proposal),
            )),
            Action::Emit(ConsensusEvent::ProposalAccepted { height, block_hash }),
        ];

        match self.local_voter() {
            Some(local) => {
                let vote = Vote::new(block_hash, local);
                actions.push(Action::Broadcast(OutboundMessage::Vote(
                    CastVoteRequest::from_vote(&vote),
                )));
                self.count_vote(vote, &mut actions);
            }
            None => {
                // Votes may have arrived before the proposal did.
                self.try_finalize(&block_hash, &mut actions);
            }
        }

        Ok(Handled::new(
            ProposalOutcome::Accepted { height, block_hash },
            actions,
        ))
    }

    fn local_voter(&self) -> Option<ValidatorId> {
        self.config
            .local_validator
            .as_ref()
            .filter(|local| self.registry.is_active(local))
            .cloned()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Vote Handling
    // ═══════════════════════════════════════════════════════════════════════════

    /// Count a vote toward a block.
    ///
    /// Votes for blocks that are already finalized return the recorded
    /// result with no side effects.
    pub fn handle_vote(&self, vote: Vote) -> Result<Handled<VoteOutcome>, ConsensusError> {
        if !self.registry.is_active(&vote.voter) {
            warn!(
                voter = %vote.voter,
                block_hash = %vote.block_hash,
                "Vote from non-validator rejected"
            );
            return Err(ConsensusError::NotAValidator(vote.voter));
        }

        if let Some(block) = self.finalized(&vote.block_hash) {
            trace!(block_hash = %vote.block_hash, "Vote for finalized block");
            return Ok(Handled::quiet(finalized_outcome(&block)));
        }

        let mut actions = Vec::new();
        let outcome = self.count_vote(vote, &mut actions);
        Ok(Handled::new(outcome, actions))
    }

    fn count_vote(&self, vote: Vote, actions: &mut Vec<Action>) -> VoteOutcome {
        let block_hash = vote.block_hash;
        let result = self.tally.record_vote(
            block_hash,
            vote.voter.clone(),
            &self.registry,
            self.clock.now(),
        );
        let quorum = result.quorum_power;

        if result.committed {
            // Lost the race with a concurrent finalization.
            if let Some(block) = self.finalized(&block_hash) {
                return finalized_outcome(&block);
            }
        }

        if result.newly_added {
            debug!(
                block_hash = %block_hash,
                voter = %vote.voter,
                voting_power = result.current_power,
                quorum_needed = quorum,
                "Vote counted"
            );
            actions.push(Action::Emit(ConsensusEvent::VoteCounted {
                block_hash,
                voting_power: result.current_power,
                quorum_needed: quorum,
            }));
        }

        if result.reached {
            if let Some(block) = self.try_finalize(&block_hash, actions) {
                return finalized_outcome(&block);
            }
        }

        VoteOutcome::Pending {
            votes: result.voter_count,
            voting_power: result.current_power,
            quorum_needed: quorum,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Finalization
    // ═══════════════════════════════════════════════════════════════════════════

    /// Commit a block whose tally holds quorum.
    ///
    /// Requires the proposal to be known and above the committed height.
    /// Quorum is measured again at the commit point, against the validator
    /// set as it stands then.
    /// The write lock serializes commits so the height advances
    /// monotonically; `try_commit` makes each hash commit at most once.
    fn try_finalize(&self, block_hash: &Hash, actions: &mut Vec<Action>) -> Option<FinalizedBlock> {
        let Some(proposal) = self.proposals.get(block_hash) else {
            debug!(block_hash = %block_hash, "Quorum reached before proposal arrived");
            return None;
        };

        let mut chain = self.chain.write();
        if proposal.height <= chain.current_height {
            debug!(
                block_hash = %block_hash,
                height = proposal.height.0,
                committed = chain.current_height.0,
                "Quorum reached for a height that is already committed"
            );
            return None;
        }

        let committed = self.tally.try_commit(block_hash, &self.registry)?;
        let block = FinalizedBlock {
            height: proposal.height,
            block_hash: *block_hash,
            proposer: proposal.proposer.clone(),
            voters: committed.voters,
            voting_power: committed.voting_power,
            quorum_needed: committed.quorum_power,
        };

        chain.current_height = block.height;
        chain.finalized.insert(*block_hash, block.clone());
        while chain.finalized.len() > self.config.finalized_history {
            if let Some((pruned, _)) = chain.finalized.shift_remove_index(0) {
                self.tally.remove(&pruned);
            }
        }
        drop(chain);

        for voter in &block.voters {
            self.registry.record_signature(voter);
        }

        self.proposals.evict(block_hash);
        for stale in self.proposals.evict_below(block.height) {
            self.tally.remove(&stale.block_hash);
        }

        info!(
            height = block.height.0,
            block_hash = %block.block_hash,
            voter_count = block.voters.len(),
            voting_power = block.voting_power,
            "Block finalized"
        );

        actions.push(Action::Emit(ConsensusEvent::BlockFinalized {
            height: block.height,
            block_hash: block.block_hash,
            voter_count: block.voters.len(),
            voting_power: block.voting_power,
        }));

        Some(block)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Timeouts
    // ═══════════════════════════════════════════════════════════════════════════

    /// Drop proposals and orphan tallies older than the round timeout.
    ///
    /// Returns the number of proposals evicted.
    pub fn evict_expired(&self) -> Handled<usize> {
        let now = self.clock.now();
        let timeout = self.config.round_timeout;
        let mut actions = Vec::new();

        let expired = self.proposals.expired(now, timeout);
        for proposal in &expired {
            if self.proposals.evict(&proposal.block_hash).is_none() {
                continue;
            }
            if !self.tally.is_committed(&proposal.block_hash) {
                self.tally.remove(&proposal.block_hash);
            }
            info!(
                height = proposal.height.0,
                block_hash = %proposal.block_hash,
                "Proposal expired without quorum"
            );
            actions.push(Action::Emit(ConsensusEvent::ProposalExpired {
                height: proposal.height,
                block_hash: proposal.block_hash,
            }));
        }

        for orphan in self.tally.expired(now, timeout) {
            if !self.proposals.contains(&orphan) {
                trace!(block_hash = %orphan, "Orphan tally expired");
                self.tally.remove(&orphan);
            }
        }

        Handled::new(actions.len(), actions)
    }
}

fn finalized_outcome(block: &FinalizedBlock) -> VoteOutcome {
    VoteOutcome::Finalized {
        height: block.height,
        votes: block.voters.len(),
        voting_power: block.voting_power,
        quorum_needed: block.quorum_needed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_test_helpers::{proposal, validator_ids, ManualClock};
    use std::time::Duration;
    use tracing_test::traced_test;

    fn make_engine(validators: usize, local: Option<usize>) -> (ConsensusEngine, Vec<ValidatorId>, Arc<ManualClock>) {
        let ids = validator_ids(validators);
        let registry = Arc::new(
            ValidatorRegistry::with_validators(ids.iter().cloned().map(|id| (id, 1))).unwrap(),
        );
        let mut config = ConsensusConfig::default().with_round_timeout(Duration::from_secs(10));
        if let Some(index) = local {
            config = config.with_local_validator(ids[index].clone());
        }
        let clock = Arc::new(ManualClock::new());
        let engine = ConsensusEngine::new(config, registry).with_clock(clock.clone());
        (engine, ids, clock)
    }

    #[traced_test]
    #[test]
    fn test_proposal_from_non_validator_rejected() {
        let (engine, _, _) = make_engine(4, None);
        let stranger = proposal(1, "stranger", b"txs");

        let err = engine.handle_proposal(stranger).unwrap_err();
        assert!(matches!(err, ConsensusError::NotAValidator(_)));
        assert_eq!(engine.state().pending_proposals, 0);
    }

    #[traced_test]
    #[test]
    fn test_new_proposal_broadcasts_and_self_votes() {
        let (engine, ids, _) = make_engine(4, Some(0));
        let p = proposal(1, ids[1].as_str(), b"txs");

        let handled = engine.handle_proposal(p.clone()).unwrap();
        assert_eq!(
            handled.outcome,
            ProposalOutcome::Accepted {
                height: BlockHeight(1),
                block_hash: p.block_hash
            }
        );

        let broadcasts: Vec<_> = handled.broadcasts().map(|m| m.type_name()).collect();
        assert_eq!(broadcasts, vec!["Proposal", "Vote"]);
        assert_eq!(engine.tally().get(&p.block_hash, engine.registry()).unwrap().voting_power, 1);
        assert_eq!(engine.registry().get(&ids[1]).unwrap().blocks_proposed, 1);
    }

    #[traced_test]
    #[test]
    fn test_observer_node_does_not_vote() {
        let (engine, ids, _) = make_engine(4, None);
        let p = proposal(1, ids[0].as_str(), b"txs");

        let handled = engine.handle_proposal(p.clone()).unwrap();
        let broadcasts: Vec<_> = handled.broadcasts().map(|m| m.type_name()).collect();
        assert_eq!(broadcasts, vec!["Proposal"]);
        assert!(engine.tally().get(&p.block_hash, engine.registry()).is_none());
    }

    #[traced_test]
    #[test]
    fn test_duplicate_proposal_is_quiet() {
        let (engine, ids, _) = make_engine(4, Some(0));
        let p = proposal(1, ids[0].as_str(), b"txs");

        engine.handle_proposal(p.clone()).unwrap();
        let again = engine.handle_proposal(p.clone()).unwrap();

        assert!(matches!(again.outcome, ProposalOutcome::AlreadyKnown { .. }));
        assert!(again.actions.is_empty());
    }

    #[traced_test]
    #[test]
    fn test_malformed_hash_rejected() {
        let (engine, ids, _) = make_engine(4, None);
        let mut p = proposal(1, ids[0].as_str(), b"txs");
        p.block_hash = Hash::from_bytes(b"not the payload");

        let err = engine.handle_proposal(p).unwrap_err();
        assert!(matches!(err, ConsensusError::MalformedRequest(_)));
    }

    #[traced_test]
    #[test]
    fn test_invalid_signature_rejected() {
        struct RejectAll;
        impl SignatureVerifier for RejectAll {
            fn verify_proposal(&self, _proposal: &BlockProposal) -> bool {
                false
            }
        }

        let (engine, ids, _) = make_engine(4, None);
        let engine = engine.with_verifier(Arc::new(RejectAll));

        let err = engine
            .handle_proposal(proposal(1, ids[0].as_str(), b"txs"))
            .unwrap_err();
        assert!(matches!(err, ConsensusError::InvalidSignature(_)));
        assert_eq!(engine.state().pending_proposals, 0);
    }

    #[traced_test]
    #[test]
    fn test_vote_from_non_validator_rejected() {
        let (engine, _, _) = make_engine(4, None);
        let vote = Vote::new(Hash::from_bytes(b"block"), ValidatorId::new("stranger"));

        let err = engine.handle_vote(vote).unwrap_err();
        assert!(matches!(err, ConsensusError::NotAValidator(_)));
    }

    #[traced_test]
    #[test]
    fn test_quorum_finalizes_and_advances_height() {
        let (engine, ids, _) = make_engine(4, None);
        let p = proposal(1, ids[0].as_str(), b"txs");
        engine.handle_proposal(p.clone()).unwrap();

        for voter in &ids[..2] {
            let handled = engine
                .handle_vote(Vote::new(p.block_hash, voter.clone()))
                .unwrap();
            assert!(!handled.outcome.is_finalized());
        }

        let handled = engine
            .handle_vote(Vote::new(p.block_hash, ids[2].clone()))
            .unwrap();
        assert_eq!(
            handled.outcome,
            VoteOutcome::Finalized {
                height: BlockHeight(1),
                votes: 3,
                voting_power: 3,
                quorum_needed: 3,
            }
        );
        assert!(handled
            .events()
            .any(|e| matches!(e, ConsensusEvent::BlockFinalized { .. })));

        assert_eq!(engine.current_height(), BlockHeight(1));
        assert!(engine.proposal(&p.block_hash).is_none());
        assert!(engine.finalized(&p.block_hash).is_some());
        assert_eq!(engine.registry().get(&ids[2]).unwrap().blocks_signed, 1);
        assert_eq!(engine.registry().get(&ids[3]).unwrap().blocks_signed, 0);
    }

    #[traced_test]
    #[test]
    fn test_votes_before_proposal_finalize_on_arrival() {
        let (engine, ids, _) = make_engine(4, None);
        let p = proposal(1, ids[0].as_str(), b"txs");

        for voter in &ids[..3] {
            let handled = engine
                .handle_vote(Vote::new(p.block_hash, voter.clone()))
                .unwrap();
            assert!(!handled.outcome.is_finalized());
        }

        let handled = engine.handle_proposal(p.clone()).unwrap();
        assert!(handled
            .events()
            .any(|e| matches!(e, ConsensusEvent::BlockFinalized { .. })));
        assert_eq!(engine.current_height(), BlockHeight(1));
    }

    #[traced_test]
    #[test]
    fn test_stale_proposal_rejected_after_commit() {
        let (engine, ids, _) = make_engine(1, Some(0));
        let first = proposal(1, ids[0].as_str(), b"one");

        let handled = engine.handle_proposal(first).unwrap();
        assert!(handled
            .events()
            .any(|e| matches!(e, ConsensusEvent::BlockFinalized { .. })));

        let late = proposal(1, ids[0].as_str(), b"late");
        let err = engine.handle_proposal(late).unwrap_err();
        assert_eq!(
            err,
            ConsensusError::StaleHeight {
                height: BlockHeight(1),
                committed: BlockHeight(1)
            }
        );
    }

    #[traced_test]
    #[test]
    fn test_finalized_proposal_resubmission_is_known() {
        let (engine, ids, _) = make_engine(1, Some(0));
        let p = proposal(1, ids[0].as_str(), b"one");
        engine.handle_proposal(p.clone()).unwrap();

        let again = engine.handle_proposal(p).unwrap();
        assert!(matches!(again.outcome, ProposalOutcome::AlreadyKnown { .. }));
        assert!(again.actions.is_empty());
    }

    #[traced_test]
    #[test]
    fn test_finalized_hash_at_other_height_is_stale() {
        let (engine, ids, _) = make_engine(1, Some(0));
        let p = proposal(1, ids[0].as_str(), b"one");
        engine.handle_proposal(p.clone()).unwrap();

        let replay = BlockProposal::with_hash(
            BlockHeight(5),
            p.block_hash,
            ids[0].clone(),
            p.signature.clone(),
        );
        let err = engine.handle_proposal(replay).unwrap_err();
        assert_eq!(
            err,
            ConsensusError::StaleHeight {
                height: BlockHeight(5),
                committed: BlockHeight(1)
            }
        );
        assert_eq!(engine.current_height(), BlockHeight(1));
        assert_eq!(engine.state().pending_proposals, 0);

        let same_height = BlockProposal::with_hash(
            BlockHeight(1),
            p.block_hash,
            ids[0].clone(),
            p.signature.clone(),
        );
        let known = engine.handle_proposal(same_height).unwrap();
        assert!(matches!(known.outcome, ProposalOutcome::AlreadyKnown { .. }));
    }

    #[traced_test]
    #[test]
    fn test_vote_after_quorum_loss_stays_pending() {
        let (engine, ids, _) = make_engine(4, None);
        let p = proposal(1, ids[0].as_str(), b"txs");
        engine.handle_proposal(p.clone()).unwrap();

        for voter in &ids[..2] {
            engine
                .handle_vote(Vote::new(p.block_hash, voter.clone()))
                .unwrap();
        }
        engine.deactivate_validator(&ids[0]);
        engine.deactivate_validator(&ids[1]);

        let handled = engine
            .handle_vote(Vote::new(p.block_hash, ids[2].clone()))
            .unwrap();
        assert_eq!(
            handled.outcome,
            VoteOutcome::Pending {
                votes: 1,
                voting_power: 1,
                quorum_needed: 2,
            }
        );
        assert_eq!(engine.current_height(), BlockHeight(0));

        let handled = engine
            .handle_vote(Vote::new(p.block_hash, ids[3].clone()))
            .unwrap();
        assert_eq!(
            handled.outcome,
            VoteOutcome::Finalized {
                height: BlockHeight(1),
                votes: 2,
                voting_power: 2,
                quorum_needed: 2,
            }
        );
        let block = engine.finalized(&p.block_hash).unwrap();
        assert_eq!(block.voters, vec![ids[2].clone(), ids[3].clone()]);
        assert_eq!(engine.registry().get(&ids[0]).unwrap().blocks_signed, 0);
    }

    #[traced_test]
    #[test]
    fn test_evict_expired_drops_old_proposals() {
        let (engine, ids, clock) = make_engine(4, Some(0));
        let old = proposal(1, ids[0].as_str(), b"old");
        engine.handle_proposal(old.clone()).unwrap();

        clock.advance(Duration::from_secs(8));
        let fresh = proposal(2, ids[1].as_str(), b"fresh");
        engine.handle_proposal(fresh.clone()).unwrap();

        clock.advance(Duration::from_secs(5));
        let handled = engine.evict_expired();

        assert_eq!(handled.outcome, 1);
        assert!(matches!(
            handled.actions.as_slice(),
            [Action::Emit(ConsensusEvent::ProposalExpired { height: BlockHeight(1), .. })]
        ));
        assert!(engine.proposal(&old.block_hash).is_none());
        assert!(engine.tally().get(&old.block_hash, engine.registry()).is_none());
        assert!(engine.proposal(&fresh.block_hash).is_some());
    }

    #[traced_test]
    #[test]
    fn test_orphan_tallies_expire() {
        let (engine, ids, clock) = make_engine(4, None);
        let unknown = Hash::from_bytes(b"never proposed");
        engine.handle_vote(Vote::new(unknown, ids[0].clone())).unwrap();

        clock.advance(Duration::from_secs(11));
        let handled = engine.evict_expired();

        assert_eq!(handled.outcome, 0);
        assert!(engine.tally().get(&unknown, engine.registry()).is_none());
    }

    #[traced_test]
    #[test]
    fn test_finalized_history_is_bounded() {
        let ids = validator_ids(1);
        let registry = Arc::new(
            ValidatorRegistry::with_validators(ids.iter().cloned().map(|id| (id, 1))).unwrap(),
        );
        let config = ConsensusConfig::default()
            .with_local_validator(ids[0].clone())
            .with_finalized_history(2);
        let engine = ConsensusEngine::new(config, registry);

        let hashes: Vec<_> = (1..=3)
            .map(|height| {
                let p = proposal(height, ids[0].as_str(), b"txs");
                engine.handle_proposal(p.clone()).unwrap();
                p.block_hash
            })
            .collect();

        assert_eq!(engine.current_height(), BlockHeight(3));
        assert!(engine.finalized(&hashes[0]).is_none());
        assert!(engine.finalized(&hashes[1]).is_some());
        assert!(engine.finalized(&hashes[2]).is_some());
        assert!(engine.tally().get(&hashes[0], engine.registry()).is_none());
    }

    #[traced_test]
    #[test]
    fn test_vote_for_pruned_block_is_pending_and_expires() {
        let ids = validator_ids(1);
        let registry = Arc::new(
            ValidatorRegistry::with_validators(ids.iter().cloned().map(|id| (id, 1))).unwrap(),
        );
        let config = ConsensusConfig::default()
            .with_local_validator(ids[0].clone())
            .with_round_timeout(Duration::from_secs(10))
            .with_finalized_history(1);
        let clock = Arc::new(ManualClock::new());
        let engine = ConsensusEngine::new(config, registry).with_clock(clock.clone());

        let first = proposal(1, ids[0].as_str(), b"one");
        engine.handle_proposal(first.clone()).unwrap();
        engine
            .handle_proposal(proposal(2, ids[0].as_str(), b"two"))
            .unwrap();
        assert!(engine.finalized(&first.block_hash).is_none());

        let handled = engine
            .handle_vote(Vote::new(first.block_hash, ids[0].clone()))
            .unwrap();
        assert_eq!(
            handled.outcome,
            VoteOutcome::Pending {
                votes: 1,
                voting_power: 1,
                quorum_needed: 1,
            }
        );
        assert_eq!(engine.current_height(), BlockHeight(2));

        let replay = engine.handle_proposal(first.clone()).unwrap_err();
        assert!(matches!(replay, ConsensusError::StaleHeight { .. }));

        clock.advance(Duration::from_secs(11));
        engine.evict_expired();
        assert!(engine.tally().get(&first.block_hash, engine.registry()).is_none());
    }
}
