//! Consensus state snapshot.

use serde::{Deserialize, Serialize};

/// Response for `GET /api/v1/consensus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusStateResponse {
    /// Height of the last finalized block (0 before the first commit).
    pub current_height: u64,
    /// Number of active validators.
    pub validator_count: usize,
    /// Total active voting power.
    pub total_power: u64,
    /// Voting power currently required for quorum.
    pub quorum_threshold: u64,
    /// Proposals awaiting finalization.
    pub pending_proposals: usize,
    /// Number of configured peers.
    pub peer_count: usize,
}
