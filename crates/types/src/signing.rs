//! Domain-separated messages for hashing and signing.
//!
//! | Tag | Purpose |
//! |-----|---------|
//! | `quorum.block.v1` | Content hash of a block proposal |
//! | `quorum.proposal:` | Proposer signature over a block hash |

use crate::{BlockHeight, Hash, ValidatorId};

/// Domain tag for block content hashing.
///
/// Format: `quorum.block.v1` || height || proposer_len || proposer || payload
pub const DOMAIN_BLOCK_HASH: &[u8] = b"quorum.block.v1";

/// Domain tag for proposal signatures.
///
/// Format: `quorum.proposal:` || height || block_hash
pub const DOMAIN_PROPOSAL: &[u8] = b"quorum.proposal:";

/// Compute the canonical content hash of a proposal.
///
/// The proposer is length-prefixed so that no two distinct
/// `(proposer, payload)` pairs share an encoding.
pub fn block_hash(height: BlockHeight, proposer: &ValidatorId, payload: &[u8]) -> Hash {
    let proposer = proposer.as_str().as_bytes();
    Hash::from_parts(&[
        DOMAIN_BLOCK_HASH,
        &height.0.to_le_bytes(),
        &(proposer.len() as u64).to_le_bytes(),
        proposer,
        payload,
    ])
}

/// Build the message a proposer signs for a proposal.
pub fn proposal_message(height: BlockHeight, block_hash: &Hash) -> Vec<u8> {
    let mut message = Vec::with_capacity(DOMAIN_PROPOSAL.len() + 8 + Hash::BYTES);
    message.extend_from_slice(DOMAIN_PROPOSAL);
    message.extend_from_slice(&height.0.to_le_bytes());
    message.extend_from_slice(block_hash.as_bytes());
    message
}
