//! Requests accepted by a consensus node.

mod proposal;
mod validator;
mod vote;

pub use proposal::ProposeBlockRequest;
pub use validator::RegisterValidatorRequest;
pub use vote::CastVoteRequest;

/// Type-safe pairing of a request with the route that serves it.
pub trait Endpoint {
    /// The response body returned for this request.
    type Response;

    /// Path of the endpoint under the `/api/v1` prefix.
    fn endpoint() -> &'static str;
}

/// Parse a required, non-empty string field.
fn require(value: &str, field: &'static str) -> Result<(), crate::MessageError> {
    if value.trim().is_empty() {
        return Err(crate::MessageError::MissingField(field));
    }
    Ok(())
}
