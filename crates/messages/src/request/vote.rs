//! Vote request.

use super::{require, Endpoint};
use crate::response::CastVoteResponse;
use crate::MessageError;
use quorum_types::{Hash, ValidatorId, Vote};
use serde::{Deserialize, Serialize};

/// Request to cast a vote for a block hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastVoteRequest {
    /// Hex-encoded hash of the block being voted for.
    pub block_hash: String,

    /// Address of the voting validator.
    pub voter: String,
}

impl CastVoteRequest {
    /// Build the wire form of a vote for forwarding to peers.
    pub fn from_vote(vote: &Vote) -> Self {
        Self {
            block_hash: vote.block_hash.to_hex(),
            voter: vote.voter.to_string(),
        }
    }

    /// Validate the request and convert it into a vote.
    pub fn into_vote(self) -> Result<Vote, MessageError> {
        require(&self.voter, "voter")?;
        let block_hash = Hash::from_hex(&self.block_hash).map_err(|source| {
            MessageError::InvalidHash {
                field: "block_hash",
                source,
            }
        })?;
        Ok(Vote::new(block_hash, ValidatorId(self.voter)))
    }
}

impl Endpoint for CastVoteRequest {
    type Response = CastVoteResponse;

    fn endpoint() -> &'static str {
        "votes"
    }
}
