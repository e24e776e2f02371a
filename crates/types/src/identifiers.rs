//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Validator identifier.
///
/// An opaque address. Addresses derived from an Ed25519 public key are the
/// lowercase hex encoding of the 32 key bytes, but any non-empty string is
/// accepted by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatorId(pub String);

impl ValidatorId {
    /// Create a validator ID from anything string-like.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Get the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that the address carries at least one non-whitespace character.
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ValidatorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Block height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHeight(pub u64);

impl BlockHeight {
    /// Genesis block height. Nothing is committed at genesis.
    pub const GENESIS: Self = BlockHeight(0);
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", self.0)
    }
}

/// Vote power (stake weight).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VotePower(pub u64);

impl VotePower {
    /// Get the raw value.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Minimum power for a strict two-thirds supermajority of `total`.
    ///
    /// `floor(total * 2 / 3) + 1`.
    pub fn quorum_threshold(total: u64) -> u64 {
        (total.saturating_mul(2) / 3) + 1
    }

    /// Check whether `voted` meets the quorum threshold for `total`.
    pub fn has_quorum(voted: u64, total: u64) -> bool {
        voted >= Self::quorum_threshold(total)
    }
}

impl fmt::Display for VotePower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
