//! Validator registration request.

use super::{require, Endpoint};
use crate::response::RegisterValidatorResponse;
use crate::MessageError;
use quorum_types::ValidatorId;
use serde::{Deserialize, Serialize};

/// Request to register (or reactivate) a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterValidatorRequest {
    /// Validator address.
    pub address: String,

    /// Voting power. Zero is rejected by the registry.
    pub voting_power: u64,
}

impl RegisterValidatorRequest {
    /// Validate the address field.
    ///
    /// Power is left to the registry, which owns the validity rule.
    pub fn validator_id(&self) -> Result<ValidatorId, MessageError> {
        require(&self.address, "address")?;
        Ok(ValidatorId(self.address.clone()))
    }
}

impl Endpoint for RegisterValidatorRequest {
    type Response = RegisterValidatorResponse;

    fn endpoint() -> &'static str {
        "validators"
    }
}
