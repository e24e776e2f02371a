//! Validator records and rejection reasons.

use crate::{ValidatorId, VotePower};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A registered identity with voting power.
///
/// Validators are never physically removed while referenced by in-flight
/// rounds; deactivation flips `active` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Unique address.
    pub id: ValidatorId,

    /// Voting weight, always at least 1.
    pub voting_power: VotePower,

    /// Inactive validators count toward neither quorum nor registry size.
    pub active: bool,

    /// Number of accepted proposals made by this validator.
    #[serde(default)]
    pub blocks_proposed: u64,

    /// Number of finalized blocks this validator voted for.
    #[serde(default)]
    pub blocks_signed: u64,
}

impl Validator {
    /// Create a new active validator.
    pub fn new(id: ValidatorId, voting_power: VotePower) -> Self {
        Self {
            id,
            voting_power,
            active: true,
            blocks_proposed: 0,
            blocks_signed: 0,
        }
    }
}

/// Why a proposal or vote was rejected.
///
/// Each variant maps to a distinct status on the wire; they are never
/// collapsed into a generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Proposer or voter is not in the active registry.
    NotAValidator,
    /// Proposal height has already been finalized.
    StaleHeight,
    /// Missing or invalid request fields.
    MalformedRequest,
    /// Signature verification was enabled and failed.
    InvalidSignature,
}

impl RejectReason {
    /// Stable snake_case label, also used as a metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::NotAValidator => "not_a_validator",
            RejectReason::StaleHeight => "stale_height",
            RejectReason::MalformedRequest => "malformed_request",
            RejectReason::InvalidSignature => "invalid_signature",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
