//! Route configuration for the RPC API.

use super::handlers::*;
use super::state::RpcState;
use axum::{
    routing::{delete, get, post},
    Router,
};

/// Create the full router with all RPC routes.
pub fn create_router(state: RpcState) -> Router {
    Router::new()
        // Health & readiness probes (no prefix)
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        // Metrics (no prefix, for Prometheus scraping)
        .route("/metrics", get(metrics_handler))
        // API v1 routes
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
}

/// Create the `/api/v1` router.
fn api_v1_routes() -> Router<RpcState> {
    Router::new()
        // Consensus endpoints (also the peer-to-peer surface)
        .route("/proposals", post(propose_handler))
        .route("/proposals/{hash}", get(get_proposal_handler))
        .route("/votes", post(vote_handler))
        .route("/consensus", get(consensus_state_handler))
        // Validator set
        .route(
            "/validators",
            post(register_validator_handler).get(list_validators_handler),
        )
        .route("/validators/{address}", delete(deactivate_validator_handler))
}
