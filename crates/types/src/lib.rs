//! Core types for Quorum consensus.
//!
//! Identifiers, hashes, proposals, votes and the quorum arithmetic shared by
//! every other crate in the workspace.

mod block;
mod crypto;
mod hash;
mod identifiers;
pub mod signing;
mod validator;

pub use block::{BlockProposal, Vote};
pub use crypto::{KeyPair, PublicKey, Signature};
pub use hash::{Hash, HexError};
pub use identifiers::{BlockHeight, ValidatorId, VotePower};
pub use validator::{RejectReason, Validator};
