//! Block proposal request.

use super::{require, Endpoint};
use crate::response::ProposeBlockResponse;
use crate::MessageError;
use quorum_types::{BlockHeight, BlockProposal, Hash, Signature, ValidatorId};
use serde::{Deserialize, Serialize};

/// Request to propose a block at a height.
///
/// At least one of `block_hash` and `payload` must be present. When both
/// are present the hash must match the content hash of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeBlockRequest {
    /// Height the block would occupy.
    pub height: u64,

    /// Hex-encoded block hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,

    /// Hex-encoded opaque payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,

    /// Address of the proposing validator.
    pub proposer: String,

    /// Hex-encoded proposer signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl ProposeBlockRequest {
    /// Build the wire form of a proposal for forwarding to peers.
    pub fn from_proposal(proposal: &BlockProposal) -> Self {
        Self {
            height: proposal.height.0,
            block_hash: Some(proposal.block_hash.to_hex()),
            payload: (!proposal.payload.is_empty()).then(|| hex::encode(&proposal.payload)),
            proposer: proposal.proposer.to_string(),
            signature: (!proposal.signature.is_empty()).then(|| proposal.signature.to_hex()),
        }
    }

    /// Validate the request and convert it into a proposal.
    pub fn into_proposal(self) -> Result<BlockProposal, MessageError> {
        require(&self.proposer, "proposer")?;
        if self.height == BlockHeight::GENESIS.0 {
            return Err(MessageError::GenesisHeight);
        }

        let height = BlockHeight(self.height);
        let proposer = ValidatorId(self.proposer);
        let signature = match self.signature {
            Some(sig) => Signature(hex::decode(sig).map_err(|_| MessageError::InvalidHex("signature"))?),
            None => Signature::empty(),
        };
        let block_hash = self
            .block_hash
            .map(|h| {
                Hash::from_hex(&h).map_err(|source| MessageError::InvalidHash {
                    field: "block_hash",
                    source,
                })
            })
            .transpose()?;
        let payload = self
            .payload
            .map(|p| hex::decode(p).map_err(|_| MessageError::InvalidHex("payload")))
            .transpose()?;

        match (block_hash, payload) {
            (None, None) => Err(MessageError::MissingBlockIdentity),
            (Some(hash), None) => Ok(BlockProposal::with_hash(height, hash, proposer, signature)),
            (hash, Some(payload)) => {
                let proposal = BlockProposal::new(height, proposer, payload, signature);
                match hash {
                    Some(claimed) if claimed != proposal.block_hash => {
                        Err(MessageError::HashMismatch {
                            expected: proposal.block_hash.to_hex(),
                        })
                    }
                    _ => Ok(proposal),
                }
            }
        }
    }
}

impl Endpoint for ProposeBlockRequest {
    type Response = ProposeBlockResponse;

    fn endpoint() -> &'static str {
        "proposals"
    }
}
