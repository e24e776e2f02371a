//! Consensus error types.

use quorum_messages::MessageError;
use quorum_types::{BlockHeight, RejectReason, ValidatorId};
use thiserror::Error;

/// A validator registration that cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidValidator {
    #[error("validator address must not be empty")]
    EmptyAddress,

    #[error("validator {0} must have positive voting power")]
    ZeroPower(ValidatorId),
}

/// Why the engine refused a proposal, vote or registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("{0} is not an active validator")]
    NotAValidator(ValidatorId),

    #[error("height {height} is not above committed height {committed}")]
    StaleHeight {
        height: BlockHeight,
        committed: BlockHeight,
    },

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("invalid signature from {0}")]
    InvalidSignature(ValidatorId),

    #[error(transparent)]
    InvalidValidator(#[from] InvalidValidator),
}

impl From<MessageError> for ConsensusError {
    fn from(err: MessageError) -> Self {
        ConsensusError::MalformedRequest(err.to_string())
    }
}

impl ConsensusError {
    /// The wire-level rejection reason for this error.
    pub fn reason(&self) -> RejectReason {
        match self {
            ConsensusError::NotAValidator(_) => RejectReason::NotAValidator,
            ConsensusError::StaleHeight { .. } => RejectReason::StaleHeight,
            ConsensusError::MalformedRequest(_) | ConsensusError::InvalidValidator(_) => {
                RejectReason::MalformedRequest
            }
            ConsensusError::InvalidSignature(_) => RejectReason::InvalidSignature,
        }
    }
}
