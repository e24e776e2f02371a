//! Round-based voting consensus.
//!
//! This crate provides a synchronous consensus engine that can be driven
//! by any runner: the HTTP validator in production, or direct calls in
//! tests.
//!
//! # Architecture
//!
//! - [`ValidatorRegistry`] → who may propose and vote, and with what power
//! - [`ProposalStore`] → proposals awaiting quorum, one slot per proposer per height
//! - [`VoteTally`] → per-block voter sets with a single commit point
//! - [`ConsensusEngine`] → ties them together and decides when a block finalizes
//!
//! Quorum is a strict two-thirds supermajority of active voting power,
//! recomputed from the live validator set on every vote.
//!
//! All I/O is performed by the runner via returned `Action`s.

mod config;
mod error;
mod registry;
mod state;
mod store;
mod tally;

pub use config::ConsensusConfig;
pub use error::{ConsensusError, InvalidValidator};
pub use registry::{ActivePower, ValidatorRegistry};
pub use state::{ConsensusEngine, ConsensusState, FinalizedBlock, ProposalOutcome, VoteOutcome};
pub use store::{ProposalStore, SubmitOutcome};
pub use tally::{TallyResult, TallySnapshot, VoteTally};
