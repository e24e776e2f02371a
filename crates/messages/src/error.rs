//! Boundary validation errors.

use quorum_types::HexError;
use thiserror::Error;

/// A request that cannot be turned into a domain value.
///
/// Every variant is reported to the caller as `malformed_request`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// A required field was empty.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// A hash field was not 32 hex-encoded bytes.
    #[error("Invalid {field}: {source}")]
    InvalidHash {
        field: &'static str,
        #[source]
        source: HexError,
    },

    /// A byte field was not valid hex.
    #[error("Invalid hex in {0}")]
    InvalidHex(&'static str),

    /// Height zero is reserved for genesis.
    #[error("Height must be at least 1")]
    GenesisHeight,

    /// Neither a block hash nor a payload was supplied.
    #[error("Either block_hash or payload is required")]
    MissingBlockIdentity,

    /// The supplied block hash does not match the payload.
    #[error("block_hash does not match payload (expected {expected})")]
    HashMismatch { expected: String },
}
