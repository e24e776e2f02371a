//! Peer fan-out against live HTTP listeners.
//!
//! Two peers accept messages and record them; a third address has nothing
//! listening. Delivery to the live peers must succeed regardless.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use parking_lot::Mutex;
use quorum_bft::{ConsensusConfig, ConsensusEngine, ProposalOutcome, ValidatorRegistry};
use quorum_core::OutboundMessage;
use quorum_messages::{CastVoteRequest, ProposeBlockRequest};
use quorum_production::{BroadcasterConfig, ConsensusService, PeerBroadcaster, PeerError};
use quorum_test_helpers::validator_ids;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_test::traced_test;

#[derive(Default)]
struct Inbox {
    proposals: Mutex<Vec<ProposeBlockRequest>>,
    votes: Mutex<Vec<CastVoteRequest>>,
}

async fn receive_proposal(
    State(inbox): State<Arc<Inbox>>,
    Json(request): Json<ProposeBlockRequest>,
) -> StatusCode {
    inbox.proposals.lock().push(request);
    StatusCode::OK
}

async fn receive_vote(
    State(inbox): State<Arc<Inbox>>,
    Json(request): Json<CastVoteRequest>,
) -> StatusCode {
    inbox.votes.lock().push(request);
    StatusCode::OK
}

async fn spawn_peer() -> (String, Arc<Inbox>) {
    let inbox = Arc::new(Inbox::default());
    let app = Router::new()
        .route("/api/v1/proposals", post(receive_proposal))
        .route("/api/v1/votes", post(receive_vote))
        .with_state(inbox.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), inbox)
}

async fn unreachable_peer() -> String {
    // Bind then drop so the port is almost certainly closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn broadcaster(peers: Vec<String>) -> PeerBroadcaster {
    PeerBroadcaster::new(
        BroadcasterConfig::new()
            .with_peers(peers)
            .with_request_timeout(Duration::from_millis(500)),
    )
    .unwrap()
}

#[traced_test]
#[tokio::test]
async fn test_broadcast_reports_per_peer_outcome() {
    let (peer_a, inbox_a) = spawn_peer().await;
    let (peer_b, inbox_b) = spawn_peer().await;
    let dead = unreachable_peer().await;

    let broadcaster = broadcaster(vec![peer_a.clone(), dead.clone(), peer_b.clone()]);
    let message = OutboundMessage::Vote(CastVoteRequest {
        block_hash: "ab".repeat(32),
        voter: "v0".into(),
    });

    let report = broadcaster.broadcast(&message).await;

    assert_eq!(report.attempted(), 3);
    assert_eq!(report.delivered.len(), 2);
    assert!(report.delivered.contains(&peer_a));
    assert!(report.delivered.contains(&peer_b));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].peer(), dead);
    assert!(matches!(
        report.failures[0],
        PeerError::Unreachable { .. } | PeerError::Timeout { .. }
    ));

    assert_eq!(inbox_a.votes.lock().len(), 1);
    assert_eq!(inbox_b.votes.lock()[0].voter, "v0");
}

#[traced_test]
#[tokio::test]
async fn test_non_success_status_is_a_failure() {
    let app = Router::new().route(
        "/api/v1/votes",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let report = broadcaster(vec![format!("http://{addr}")])
        .broadcast(&OutboundMessage::Vote(CastVoteRequest {
            block_hash: "cd".repeat(32),
            voter: "v1".into(),
        }))
        .await;

    assert_eq!(
        report.failures,
        vec![PeerError::Status {
            peer: format!("http://{addr}"),
            status: 500,
        }]
    );
}

#[traced_test]
#[tokio::test]
async fn test_proposal_succeeds_with_one_peer_down() {
    let (peer_a, inbox_a) = spawn_peer().await;
    let (peer_b, inbox_b) = spawn_peer().await;
    let dead = unreachable_peer().await;

    let ids = validator_ids(4);
    let registry = Arc::new(
        ValidatorRegistry::with_validators(ids.iter().cloned().map(|id| (id, 1))).unwrap(),
    );
    let engine = Arc::new(ConsensusEngine::new(
        ConsensusConfig::new().with_local_validator(ids[0].clone()),
        registry,
    ));
    let service = ConsensusService::new(
        engine,
        Arc::new(broadcaster(vec![peer_a, dead, peer_b])),
    );

    let outcome = service
        .propose(ProposeBlockRequest {
            height: 1,
            block_hash: None,
            payload: Some(hex::encode(b"txs")),
            proposer: "v1".into(),
            signature: None,
        })
        .unwrap();
    let block_hash = match outcome {
        ProposalOutcome::Accepted { block_hash, .. } => block_hash,
        other => panic!("expected accepted proposal, got {other:?}"),
    };

    // Delivery is detached from the request; wait for both live peers.
    for _ in 0..100 {
        let received = |inbox: &Inbox| {
            inbox.votes.lock().len() == 1 && inbox.proposals.lock().len() == 1
        };
        if received(inbox_a.as_ref()) && received(inbox_b.as_ref()) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    for inbox in [&inbox_a, &inbox_b] {
        let votes = inbox.votes.lock();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].voter, "v0");
        assert_eq!(votes[0].block_hash, block_hash.to_hex());
        assert_eq!(inbox.proposals.lock().len(), 1);
    }
}
