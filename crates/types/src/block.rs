//! Block proposals and votes.

use crate::{signing, BlockHeight, Hash, Signature, ValidatorId};
use std::time::Duration;

/// A candidate block submitted by a validator for a given height.
///
/// The payload is opaque application data; the core never interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockProposal {
    /// Height this block would occupy once finalized.
    pub height: BlockHeight,

    /// Content-derived fingerprint identifying this proposal.
    pub block_hash: Hash,

    /// Validator that proposed this block.
    pub proposer: ValidatorId,

    /// Opaque application data (transactions).
    pub payload: Vec<u8>,

    /// Proposer's signature over `signing::proposal_message`.
    pub signature: Signature,

    /// Clock reading when the proposal was accepted locally.
    ///
    /// Used for round timeout eviction.
    pub received_at: Duration,
}

impl BlockProposal {
    /// Build a proposal whose hash is derived from its content.
    pub fn new(
        height: BlockHeight,
        proposer: ValidatorId,
        payload: Vec<u8>,
        signature: Signature,
    ) -> Self {
        let block_hash = signing::block_hash(height, &proposer, &payload);
        Self {
            height,
            block_hash,
            proposer,
            payload,
            signature,
            received_at: Duration::ZERO,
        }
    }

    /// Build a proposal that names its block hash directly.
    ///
    /// Used when the caller only forwards the fingerprint and not the payload.
    pub fn with_hash(
        height: BlockHeight,
        block_hash: Hash,
        proposer: ValidatorId,
        signature: Signature,
    ) -> Self {
        Self {
            height,
            block_hash,
            proposer,
            payload: Vec::new(),
            signature,
            received_at: Duration::ZERO,
        }
    }

    /// Whether the stored hash matches the payload content.
    ///
    /// Hash-only proposals (empty payload) are not checked.
    pub fn hash_matches_payload(&self) -> bool {
        self.payload.is_empty()
            || signing::block_hash(self.height, &self.proposer, &self.payload) == self.block_hash
    }

    /// The message the proposer signs.
    pub fn signing_message(&self) -> Vec<u8> {
        signing::proposal_message(self.height, &self.block_hash)
    }
}

/// A vote for a specific block hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Vote {
    /// Which proposal this vote supports.
    pub block_hash: Hash,

    /// The validator casting the vote.
    pub voter: ValidatorId,
}

impl Vote {
    /// Create a new vote.
    pub fn new(block_hash: Hash, voter: ValidatorId) -> Self {
        Self { block_hash, voter }
    }
}
