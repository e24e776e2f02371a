//! Validator registry.
//!
//! Tracks the validator set and answers quorum arithmetic against the
//! live active set. Every quorum query recomputes from the current state,
//! so deactivations and power updates take effect on the next vote.

use crate::InvalidValidator;
use indexmap::IndexMap;
use parking_lot::RwLock;
use quorum_types::{Validator, ValidatorId, VotePower};
use tracing::{debug, info};

/// Voting power behind a set of voters, measured against the active set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePower {
    /// Voters that are active now, in the order given.
    pub counted: Vec<ValidatorId>,
    /// Summed power of `counted`.
    pub voted: u64,
    /// Total power of the active set.
    pub total: u64,
}

impl ActivePower {
    /// Power required for quorum over `total`.
    pub fn quorum(&self) -> u64 {
        VotePower::quorum_threshold(self.total)
    }

    /// Whether the counted power meets quorum.
    pub fn reached(&self) -> bool {
        VotePower::has_quorum(self.voted, self.total)
    }
}

/// The set of known validators.
///
/// Validators are never removed; deactivation clears the `active` flag so
/// that in-flight tallies keep a stable view of who voted.
#[derive(Debug, Default)]
pub struct ValidatorRegistry {
    validators: RwLock<IndexMap<ValidatorId, Validator>>,
}

impl ValidatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with a genesis set.
    pub fn with_validators(
        validators: impl IntoIterator<Item = (ValidatorId, u64)>,
    ) -> Result<Self, InvalidValidator> {
        let registry = Self::new();
        for (id, power) in validators {
            registry.register(id, power)?;
        }
        Ok(registry)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Mutation
    // ═══════════════════════════════════════════════════════════════════════════

    /// Add a validator, or update the power of an existing one.
    ///
    /// Re-registering a deactivated validator reactivates it. Participation
    /// counters survive updates.
    pub fn register(&self, id: ValidatorId, power: u64) -> Result<Validator, InvalidValidator> {
        if !id.is_valid() {
            return Err(InvalidValidator::EmptyAddress);
        }
        if power == 0 {
            return Err(InvalidValidator::ZeroPower(id));
        }

        let mut validators = self.validators.write();
        let validator = validators
            .entry(id.clone())
            .and_modify(|existing| {
                existing.voting_power = VotePower(power);
                existing.active = true;
            })
            .or_insert_with(|| Validator::new(id.clone(), VotePower(power)))
            .clone();

        info!(
            validator = %id,
            voting_power = power,
            total_validators = validators.values().filter(|v| v.active).count(),
            "Validator registered"
        );
        Ok(validator)
    }

    /// Mark a validator inactive.
    ///
    /// Returns true if the validator was active. Unknown or already
    /// inactive addresses are a no-op.
    pub fn deactivate(&self, id: &ValidatorId) -> bool {
        let mut validators = self.validators.write();
        match validators.get_mut(id) {
            Some(validator) if validator.active => {
                validator.active = false;
                info!(validator = %id, "Validator deactivated");
                true
            }
            _ => {
                debug!(validator = %id, "Deactivate ignored for unknown or inactive validator");
                false
            }
        }
    }

    /// Count an accepted proposal for its proposer.
    pub fn record_proposal(&self, id: &ValidatorId) {
        if let Some(validator) = self.validators.write().get_mut(id) {
            validator.blocks_proposed += 1;
        }
    }

    /// Count a finalized block for one of its voters.
    pub fn record_signature(&self, id: &ValidatorId) {
        if let Some(validator) = self.validators.write().get_mut(id) {
            validator.blocks_signed += 1;
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════════

    /// Whether the address belongs to an active validator.
    pub fn is_active(&self, id: &ValidatorId) -> bool {
        self.validators
            .read()
            .get(id)
            .is_some_and(|validator| validator.active)
    }

    /// Voting power of an active validator.
    pub fn voting_power(&self, id: &ValidatorId) -> Option<u64> {
        self.validators
            .read()
            .get(id)
            .filter(|validator| validator.active)
            .map(|validator| validator.voting_power.get())
    }

    /// Sum of voting power over active validators.
    pub fn total_active_power(&self) -> u64 {
        self.validators
            .read()
            .values()
            .filter(|validator| validator.active)
            .map(|validator| validator.voting_power.get())
            .sum()
    }

    /// Number of active validators.
    pub fn active_count(&self) -> usize {
        self.validators
            .read()
            .values()
            .filter(|validator| validator.active)
            .count()
    }

    /// Minimum power required to finalize, from the live active set.
    pub fn quorum_threshold(&self) -> u64 {
        VotePower::quorum_threshold(self.total_active_power())
    }

    /// Measure the current power of `voters` and of the whole active set.
    ///
    /// Both sums come from one read of the registry, so a deactivation or
    /// power change applies to each side of the quorum comparison alike.
    /// Inactive and unknown voters contribute nothing.
    pub fn measure<'a>(&self, voters: impl IntoIterator<Item = &'a ValidatorId>) -> ActivePower {
        let validators = self.validators.read();
        let mut counted = Vec::new();
        let mut voted = 0u64;
        for id in voters {
            if let Some(validator) = validators.get(id).filter(|v| v.active) {
                voted = voted.saturating_add(validator.voting_power.get());
                counted.push(id.clone());
            }
        }
        let total = validators
            .values()
            .filter(|validator| validator.active)
            .map(|validator| validator.voting_power.get())
            .sum();

        ActivePower {
            counted,
            voted,
            total,
        }
    }

    /// Look up a validator record, active or not.
    pub fn get(&self, id: &ValidatorId) -> Option<Validator> {
        self.validators.read().get(id).cloned()
    }

    /// All validator records in registration order.
    pub fn snapshot(&self) -> Vec<Validator> {
        self.validators.read().values().cloned().collect()
    }
}
