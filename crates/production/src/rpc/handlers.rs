//! HTTP request handlers for the RPC API.

use super::state::RpcState;
use super::types::*;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use prometheus::{Encoder, TextEncoder};
use quorum_bft::{ProposalOutcome, VoteOutcome};
use quorum_messages::{
    CastVoteRequest, CastVoteResponse, ProposalView, ProposeBlockRequest, ProposeBlockResponse,
    RegisterValidatorRequest, RegisterValidatorResponse, VoteStatus,
};
use quorum_types::{Hash, RejectReason, ValidatorId};
use std::sync::atomic::Ordering;

/// HTTP status for each rejection reason.
pub fn status_for(reason: RejectReason) -> StatusCode {
    match reason {
        RejectReason::NotAValidator => StatusCode::FORBIDDEN,
        RejectReason::StaleHeight => StatusCode::CONFLICT,
        RejectReason::MalformedRequest => StatusCode::BAD_REQUEST,
        RejectReason::InvalidSignature => StatusCode::UNAUTHORIZED,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Health & Readiness Handlers
// ═══════════════════════════════════════════════════════════════════════════

/// Handler for `GET /health` - liveness probe.
pub async fn health_handler(State(state): State<RpcState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handler for `GET /ready` - readiness probe.
pub async fn ready_handler(State(state): State<RpcState>) -> impl IntoResponse {
    if state.ready.load(Ordering::SeqCst) {
        (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready".to_string(),
                ready: true,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                status: "not_ready".to_string(),
                ready: false,
            }),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Metrics Handler
// ═══════════════════════════════════════════════════════════════════════════

/// Handler for `GET /metrics` - Prometheus metrics.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = ?e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics".to_string(),
        )
            .into_response();
    }

    (
        [(
            axum::http::header::CONTENT_TYPE,
            encoder.format_type().to_string(),
        )],
        buffer,
    )
        .into_response()
}

// ═══════════════════════════════════════════════════════════════════════════
// Consensus Handlers
// ═══════════════════════════════════════════════════════════════════════════

/// Handler for `POST /api/v1/proposals` - propose a block.
pub async fn propose_handler(
    State(state): State<RpcState>,
    payload: Result<Json<ProposeBlockRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Malformed proposal body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ProposeBlockResponse::rejected(
                    0,
                    RejectReason::MalformedRequest,
                    rejection.body_text(),
                )),
            )
                .into_response();
        }
    };

    let height = request.height;
    match state.service.propose(request) {
        Ok(ProposalOutcome::Accepted { height, block_hash })
        | Ok(ProposalOutcome::AlreadyKnown { height, block_hash }) => (
            StatusCode::OK,
            Json(ProposeBlockResponse::accepted(height.0, block_hash)),
        )
            .into_response(),
        Err(e) => {
            let reason = e.reason();
            (
                status_for(reason),
                Json(ProposeBlockResponse::rejected(height, reason, e.to_string())),
            )
                .into_response()
        }
    }
}

/// Handler for `POST /api/v1/votes` - cast a vote.
pub async fn vote_handler(
    State(state): State<RpcState>,
    payload: Result<Json<CastVoteRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(CastVoteResponse::rejected(
                    RejectReason::MalformedRequest,
                    rejection.body_text(),
                )),
            )
                .into_response();
        }
    };

    match state.service.vote(request) {
        Ok((block_hash, outcome)) => {
            let body = match outcome {
                VoteOutcome::Pending {
                    votes,
                    voting_power,
                    quorum_needed,
                } => CastVoteResponse::counted(
                    VoteStatus::Pending,
                    block_hash,
                    votes,
                    voting_power,
                    quorum_needed,
                ),
                VoteOutcome::Finalized {
                    votes,
                    voting_power,
                    quorum_needed,
                    ..
                } => CastVoteResponse::counted(
                    VoteStatus::Finalized,
                    block_hash,
                    votes,
                    voting_power,
                    quorum_needed,
                ),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            let reason = e.reason();
            (
                status_for(reason),
                Json(CastVoteResponse::rejected(reason, e.to_string())),
            )
                .into_response()
        }
    }
}

/// Handler for `POST /api/v1/validators` - register a validator.
pub async fn register_validator_handler(
    State(state): State<RpcState>,
    payload: Result<Json<RegisterValidatorRequest>, JsonRejection>,
) -> Response {
    let registry = state.service.engine().registry().clone();
    let result = match payload {
        Ok(Json(request)) => state.service.register(request).map_err(|e| e.to_string()),
        Err(rejection) => Err(rejection.body_text()),
    };

    let (status, error) = match result {
        Ok(_) => (StatusCode::OK, None),
        Err(error) => (StatusCode::BAD_REQUEST, Some(error)),
    };

    (
        status,
        Json(RegisterValidatorResponse {
            success: error.is_none(),
            total_validators: registry.active_count(),
            total_power: registry.total_active_power(),
            error,
        }),
    )
        .into_response()
}

/// Handler for `DELETE /api/v1/validators/{address}` - deactivate a validator.
pub async fn deactivate_validator_handler(
    State(state): State<RpcState>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    let changed = state.service.deactivate(&ValidatorId::new(address));
    let registry = state.service.engine().registry();

    Json(RegisterValidatorResponse {
        success: changed,
        total_validators: registry.active_count(),
        total_power: registry.total_active_power(),
        error: (!changed).then(|| "validator not active".to_string()),
    })
}

/// Handler for `GET /api/v1/validators` - list the validator set.
pub async fn list_validators_handler(State(state): State<RpcState>) -> impl IntoResponse {
    Json(state.service.engine().registry().snapshot())
}

/// Handler for `GET /api/v1/consensus` - consensus state.
pub async fn consensus_state_handler(State(state): State<RpcState>) -> impl IntoResponse {
    Json(state.service.state())
}

/// Handler for `GET /api/v1/proposals/{hash}` - pending proposal lookup.
pub async fn get_proposal_handler(
    State(state): State<RpcState>,
    Path(hash): Path<String>,
) -> Response {
    let block_hash = match Hash::from_hex(&hash) {
        Ok(hash) => hash,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(format!("Invalid block hash: {e}"))),
            )
                .into_response();
        }
    };

    let engine = state.service.engine();
    match engine.proposal(&block_hash) {
        Some(proposal) => {
            let tally = engine.tally().get(&block_hash, engine.registry());
            let (votes, power) = tally
                .map(|t| (t.voters.len(), t.voting_power))
                .unwrap_or((0, 0));
            (
                StatusCode::OK,
                Json(ProposalView::new(&proposal, votes, power)),
            )
                .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Proposal not pending")),
        )
            .into_response(),
    }
}
