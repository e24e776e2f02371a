//! Consensus service: runs the engine and executes its actions.
//!
//! Request handlers call into the service with wire requests. The service
//! converts them at the boundary, drives the engine, then hands broadcasts
//! to the message sink and turns events into metrics.

use crate::metrics;
use quorum_bft::{ConsensusEngine, ConsensusError, ProposalOutcome, VoteOutcome};
use quorum_core::{Action, ConsensusEvent, MessageSink};
use quorum_messages::{
    CastVoteRequest, ConsensusStateResponse, ProposeBlockRequest, RegisterValidatorRequest,
};
use quorum_types::{Hash, Validator, ValidatorId};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Shared handle to a running validator's consensus.
pub struct ConsensusService {
    engine: Arc<ConsensusEngine>,
    sink: Arc<dyn MessageSink>,
}

impl ConsensusService {
    /// Create a service over an engine and a message sink.
    pub fn new(engine: Arc<ConsensusEngine>, sink: Arc<dyn MessageSink>) -> Self {
        let service = Self { engine, sink };
        service.refresh_gauges();
        service
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Arc<ConsensusEngine> {
        &self.engine
    }

    /// Number of peers broadcasts are delivered to.
    pub fn peer_count(&self) -> usize {
        self.sink.peer_count()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Operations
    // ═══════════════════════════════════════════════════════════════════════════

    /// Submit a proposal.
    #[instrument(skip(self, request), fields(height = request.height, proposer = %request.proposer))]
    pub fn propose(&self, request: ProposeBlockRequest) -> Result<ProposalOutcome, ConsensusError> {
        let result = request
            .into_proposal()
            .map_err(ConsensusError::from)
            .and_then(|proposal| self.engine.handle_proposal(proposal));

        match result {
            Ok(handled) => {
                self.execute(handled.actions);
                Ok(handled.outcome)
            }
            Err(e) => {
                metrics::record_proposal_rejected(e.reason().as_str());
                Err(e)
            }
        }
    }

    /// Cast a vote. Returns the hash voted for and the resulting tally.
    #[instrument(skip(self, request), fields(voter = %request.voter))]
    pub fn vote(&self, request: CastVoteRequest) -> Result<(Hash, VoteOutcome), ConsensusError> {
        let result = request
            .into_vote()
            .map_err(ConsensusError::from)
            .and_then(|vote| {
                let block_hash = vote.block_hash;
                self.engine
                    .handle_vote(vote)
                    .map(|handled| (block_hash, handled))
            });

        match result {
            Ok((block_hash, handled)) => {
                self.execute(handled.actions);
                Ok((block_hash, handled.outcome))
            }
            Err(e) => {
                metrics::record_vote_rejected(e.reason().as_str());
                Err(e)
            }
        }
    }

    /// Register or update a validator.
    pub fn register(&self, request: RegisterValidatorRequest) -> Result<Validator, ConsensusError> {
        let id = request.validator_id()?;
        let validator = self.engine.register_validator(id, request.voting_power)?;
        self.refresh_gauges();
        Ok(validator)
    }

    /// Deactivate a validator. Returns true if it was active.
    pub fn deactivate(&self, id: &ValidatorId) -> bool {
        let changed = self.engine.deactivate_validator(id);
        self.refresh_gauges();
        changed
    }

    /// Evict proposals past the round timeout.
    pub fn evict_expired(&self) -> usize {
        let handled = self.engine.evict_expired();
        self.execute(handled.actions);
        handled.outcome
    }

    /// Snapshot of consensus state for the API.
    pub fn state(&self) -> ConsensusStateResponse {
        let state = self.engine.state();
        ConsensusStateResponse {
            current_height: state.current_height.0,
            validator_count: state.validator_count,
            total_power: state.total_power,
            quorum_threshold: state.quorum_threshold,
            pending_proposals: state.pending_proposals,
            peer_count: self.sink.peer_count(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Action Execution
    // ═══════════════════════════════════════════════════════════════════════════

    fn execute(&self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Broadcast(message) => {
                    metrics::record_broadcast(message.type_name());
                    self.sink.send(message);
                }
                Action::Emit(event) => self.observe(&event),
            }
        }
        metrics::set_pending_proposals(self.engine.proposals().len());
    }

    fn observe(&self, event: &ConsensusEvent) {
        debug!(event = event.type_name(), "Consensus event");
        match event {
            ConsensusEvent::ProposalAccepted { .. } => metrics::record_proposal_accepted(),
            ConsensusEvent::VoteCounted { .. } => metrics::record_vote_counted(),
            ConsensusEvent::BlockFinalized { height, .. } => {
                metrics::record_block_finalized(height.0)
            }
            ConsensusEvent::ProposalExpired { .. } => metrics::record_proposal_expired(),
        }
    }

    fn refresh_gauges(&self) {
        let registry = self.engine.registry();
        metrics::set_validator_set(registry.active_count(), registry.total_active_power());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_bft::{ConsensusConfig, ValidatorRegistry};
    use quorum_core::OutboundMessage;
    use quorum_test_helpers::{validator_ids, RecordingSink};
    use quorum_types::RejectReason;
    use tracing_test::traced_test;

    fn make_service(local: bool) -> (ConsensusService, Arc<RecordingSink>, Vec<ValidatorId>) {
        let ids = validator_ids(3);
        let registry = Arc::new(
            ValidatorRegistry::with_validators(ids.iter().cloned().map(|id| (id, 1))).unwrap(),
        );
        let mut config = ConsensusConfig::new();
        if local {
            config = config.with_local_validator(ids[0].clone());
        }
        let engine = Arc::new(ConsensusEngine::new(config, registry));
        let sink = Arc::new(RecordingSink::new(2));
        let service = ConsensusService::new(engine, sink.clone());
        (service, sink, ids)
    }

    fn propose_request(height: u64, proposer: &str) -> ProposeBlockRequest {
        ProposeBlockRequest {
            height,
            block_hash: None,
            payload: Some(hex::encode(b"txs")),
            proposer: proposer.to_string(),
            signature: None,
        }
    }

    #[traced_test]
    #[test]
    fn test_propose_forwards_proposal_and_self_vote() {
        let (service, sink, _) = make_service(true);

        let outcome = service.propose(propose_request(1, "v1")).unwrap();
        assert!(matches!(outcome, ProposalOutcome::Accepted { .. }));

        let sent = sink.take();
        assert_eq!(sent.len(), 2);
        assert!(matches!(sent[0], OutboundMessage::Proposal(_)));
        assert!(matches!(&sent[1], OutboundMessage::Vote(v) if v.voter == "v0"));
        assert_eq!(service.state().pending_proposals, 1);
        assert_eq!(service.state().peer_count, 2);
    }

    #[traced_test]
    #[test]
    fn test_malformed_proposal_is_rejected_before_engine() {
        let (service, sink, _) = make_service(true);
        let mut request = propose_request(1, "v1");
        request.payload = None;

        let err = service.propose(request).unwrap_err();
        assert_eq!(err.reason(), RejectReason::MalformedRequest);
        assert!(sink.sent().is_empty());
    }

    #[traced_test]
    #[test]
    fn test_vote_path_finalizes() {
        let (service, _, ids) = make_service(false);
        let outcome = service.propose(propose_request(1, "v1")).unwrap();
        let block_hash = outcome.block_hash().to_hex();

        for (i, id) in ids.iter().enumerate() {
            let (voted, result) = service
                .vote(CastVoteRequest {
                    block_hash: block_hash.clone(),
                    voter: id.to_string(),
                })
                .unwrap();
            assert_eq!(voted, outcome.block_hash());
            assert_eq!(result.is_finalized(), i == 2);
        }
        assert_eq!(service.state().current_height, 1);
    }

    #[traced_test]
    #[test]
    fn test_register_and_deactivate_update_state() {
        let (service, _, _) = make_service(false);

        service
            .register(RegisterValidatorRequest {
                address: "v3".into(),
                voting_power: 3,
            })
            .unwrap();
        assert_eq!(service.state().total_power, 6);

        assert!(service.deactivate(&ValidatorId::new("v3")));
        assert_eq!(service.state().total_power, 3);

        let err = service
            .register(RegisterValidatorRequest {
                address: "v4".into(),
                voting_power: 0,
            })
            .unwrap_err();
        assert_eq!(err.reason(), RejectReason::MalformedRequest);
    }
}
