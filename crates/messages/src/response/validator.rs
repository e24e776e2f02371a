//! Validator registration responses.

use serde::{Deserialize, Serialize};

/// Response for `POST /api/v1/validators` and `DELETE /api/v1/validators/{address}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterValidatorResponse {
    pub success: bool,
    /// Number of active validators after the change.
    pub total_validators: usize,
    /// Total active voting power after the change.
    pub total_power: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
