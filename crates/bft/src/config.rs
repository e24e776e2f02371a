//! Consensus configuration.

use quorum_types::ValidatorId;
use std::time::Duration;

/// Configuration for the consensus engine.
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Address this node votes as, if it is a validator.
    ///
    /// When set and active in the registry, the engine casts a vote for
    /// every new proposal it accepts.
    pub local_validator: Option<ValidatorId>,

    /// How long a proposal may stay pending before it is evicted.
    pub round_timeout: Duration,

    /// Number of finalized blocks remembered for idempotent vote replies.
    ///
    /// Once a block falls out of this window the engine no longer recognizes
    /// its hash. A late vote for it is tallied like a vote for an unseen
    /// block and answers `Pending`. That tally can never commit, because any
    /// proposal carrying the hash is at or below the committed height and is
    /// rejected as stale. The round timeout drops it.
    pub finalized_history: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            local_validator: None,
            round_timeout: Duration::from_secs(30),
            finalized_history: 1024,
        }
    }
}

impl ConsensusConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the local validator address.
    pub fn with_local_validator(mut self, id: ValidatorId) -> Self {
        self.local_validator = Some(id);
        self
    }

    /// Set the round timeout.
    pub fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = timeout;
        self
    }

    /// Set the finalized history bound (at least 1).
    ///
    /// Votes for blocks older than the bound answer `Pending` rather than
    /// `Finalized`; see [`ConsensusConfig::finalized_history`].
    pub fn with_finalized_history(mut self, blocks: usize) -> Self {
        self.finalized_history = blocks.max(1);
        self
    }
}
