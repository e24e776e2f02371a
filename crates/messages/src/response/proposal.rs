//! Proposal responses.

use quorum_types::{BlockProposal, Hash, RejectReason};
use serde::{Deserialize, Serialize};

/// Outcome of a proposal submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Accepted,
    Rejected,
}

/// Response for `POST /api/v1/proposals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeBlockResponse {
    pub status: ProposalStatus,
    /// Height named in the request.
    pub height: u64,
    /// Hash of the accepted proposal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<Hash>,
    /// Why the proposal was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    /// Human-readable detail for a rejection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProposeBlockResponse {
    /// An accepted proposal.
    pub fn accepted(height: u64, block_hash: Hash) -> Self {
        Self {
            status: ProposalStatus::Accepted,
            height,
            block_hash: Some(block_hash),
            reason: None,
            error: None,
        }
    }

    /// A rejected proposal.
    pub fn rejected(height: u64, reason: RejectReason, error: impl Into<String>) -> Self {
        Self {
            status: ProposalStatus::Rejected,
            height,
            block_hash: None,
            reason: Some(reason),
            error: Some(error.into()),
        }
    }
}

/// Response for `GET /api/v1/proposals/{hash}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalView {
    pub height: u64,
    pub block_hash: Hash,
    pub proposer: String,
    /// Hex-encoded payload.
    pub payload: String,
    /// Distinct voters counted so far.
    pub votes: usize,
    /// Voting power counted so far.
    pub voting_power: u64,
}

impl ProposalView {
    /// Render a stored proposal with its current tally.
    pub fn new(proposal: &BlockProposal, votes: usize, voting_power: u64) -> Self {
        Self {
            height: proposal.height.0,
            block_hash: proposal.block_hash,
            proposer: proposal.proposer.to_string(),
            payload: hex::encode(&proposal.payload),
            votes,
            voting_power,
        }
    }
}
