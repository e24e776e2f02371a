//! Responses returned by a consensus node.

mod proposal;
mod state;
mod validator;
mod vote;

pub use proposal::{ProposalStatus, ProposalView, ProposeBlockResponse};
pub use state::ConsensusStateResponse;
pub use validator::RegisterValidatorResponse;
pub use vote::{CastVoteResponse, VoteStatus};
