//! Outbound message types for network communication.

use quorum_messages::{CastVoteRequest, Endpoint, ProposeBlockRequest};

/// Outbound peer messages.
///
/// These are the messages a node sends to every other node. The runner
/// handles the actual network I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Forward a newly accepted proposal.
    Proposal(ProposeBlockRequest),

    /// Announce this node's vote for a block.
    Vote(CastVoteRequest),
}

impl OutboundMessage {
    /// Get a human-readable name for this message type.
    pub fn type_name(&self) -> &'static str {
        match self {
            OutboundMessage::Proposal(_) => "Proposal",
            OutboundMessage::Vote(_) => "Vote",
        }
    }

    /// Endpoint path (under `/api/v1`) that receives this message.
    pub fn endpoint(&self) -> &'static str {
        match self {
            OutboundMessage::Proposal(_) => ProposeBlockRequest::endpoint(),
            OutboundMessage::Vote(_) => CastVoteRequest::endpoint(),
        }
    }
}
