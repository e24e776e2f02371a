//! Vote responses.

use quorum_types::{Hash, RejectReason};
use serde::{Deserialize, Serialize};

/// State of a block hash after a vote was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteStatus {
    Pending,
    Finalized,
    Rejected,
}

/// Response for `POST /api/v1/votes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastVoteResponse {
    pub status: VoteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<Hash>,
    /// Distinct voters counted for the block.
    pub votes: usize,
    /// Voting power counted for the block.
    pub voting_power: u64,
    /// Voting power required for quorum.
    pub quorum_needed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CastVoteResponse {
    /// A counted vote, pending or finalized.
    pub fn counted(
        status: VoteStatus,
        block_hash: Hash,
        votes: usize,
        voting_power: u64,
        quorum_needed: u64,
    ) -> Self {
        Self {
            status,
            block_hash: Some(block_hash),
            votes,
            voting_power,
            quorum_needed,
            reason: None,
            error: None,
        }
    }

    /// A rejected vote.
    pub fn rejected(reason: RejectReason, error: impl Into<String>) -> Self {
        Self {
            status: VoteStatus::Rejected,
            block_hash: None,
            votes: 0,
            voting_power: 0,
            quorum_needed: 0,
            reason: Some(reason),
            error: Some(error.into()),
        }
    }
}
