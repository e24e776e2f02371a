//! Request and response messages for the consensus protocol.
//!
//! The same request types serve client submissions and peer-to-peer
//! dissemination: a peer forwards a proposal by posting a
//! [`ProposeBlockRequest`] to the proposals endpoint of every other node.
//!
//! Wire types carry loosely-typed fields (hex strings, plain integers).
//! Each request converts into its typed domain value at the boundary and
//! reports a [`MessageError`] for anything malformed, before the engine
//! ever sees it.

mod error;
pub mod request;
pub mod response;

pub use error::MessageError;
pub use request::{
    CastVoteRequest, Endpoint, ProposeBlockRequest, RegisterValidatorRequest,
};
pub use response::{
    CastVoteResponse, ConsensusStateResponse, ProposalStatus, ProposalView,
    ProposeBlockResponse, RegisterValidatorResponse, VoteStatus,
};
