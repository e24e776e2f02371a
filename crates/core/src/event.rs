//! Events emitted to external observers.

use quorum_types::{BlockHeight, Hash};

/// Notifications about round progress.
///
/// Observers (logging, metrics) receive these through `Action::Emit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusEvent {
    /// A proposal was accepted and entered voting.
    ProposalAccepted {
        height: BlockHeight,
        block_hash: Hash,
    },

    /// A vote was counted toward a block's tally.
    VoteCounted {
        block_hash: Hash,
        voting_power: u64,
        quorum_needed: u64,
    },

    /// A block reached quorum and was committed.
    BlockFinalized {
        height: BlockHeight,
        block_hash: Hash,
        voter_count: usize,
        voting_power: u64,
    },

    /// A proposal aged out without reaching quorum.
    ProposalExpired {
        height: BlockHeight,
        block_hash: Hash,
    },
}

impl ConsensusEvent {
    /// Get a human-readable name for this event type.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConsensusEvent::ProposalAccepted { .. } => "ProposalAccepted",
            ConsensusEvent::VoteCounted { .. } => "VoteCounted",
            ConsensusEvent::BlockFinalized { .. } => "BlockFinalized",
            ConsensusEvent::ProposalExpired { .. } => "ProposalExpired",
        }
    }
}
