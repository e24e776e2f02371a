//! Best-effort HTTP fan-out to peer validators.
//!
//! Each peer is contacted by its own task with its own timeout, so a slow
//! or unreachable peer never delays delivery to the others. Failures are
//! logged and counted, never retried and never surfaced to the caller
//! that triggered the broadcast.

use crate::metrics;
use bytes::Bytes;
use quorum_core::{MessageSink, OutboundMessage};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, warn};

/// Delivery failure for a single peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError {
    #[error("peer {peer} unreachable: {reason}")]
    Unreachable { peer: String, reason: String },

    #[error("peer {peer} timed out after {timeout:?}")]
    Timeout { peer: String, timeout: Duration },

    #[error("peer {peer} responded with status {status}")]
    Status { peer: String, status: u16 },
}

impl PeerError {
    /// The peer this failure belongs to.
    pub fn peer(&self) -> &str {
        match self {
            PeerError::Unreachable { peer, .. }
            | PeerError::Timeout { peer, .. }
            | PeerError::Status { peer, .. } => peer,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PeerError::Unreachable { .. } => "unreachable",
            PeerError::Timeout { .. } => "timeout",
            PeerError::Status { .. } => "status",
        }
    }
}

/// What happened to one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Peers that acknowledged with a success status.
    pub delivered: Vec<String>,
    /// Peers that did not.
    pub failures: Vec<PeerError>,
}

impl BroadcastReport {
    /// Number of peers contacted.
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failures.len()
    }

    /// Whether every peer acknowledged.
    pub fn all_delivered(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Configuration for peer fan-out.
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Peer base URLs, e.g. `http://10.0.0.2:8080`.
    pub peers: Vec<String>,
    /// Per-peer request timeout.
    pub request_timeout: Duration,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            peers: Vec::new(),
            request_timeout: Duration::from_secs(2),
        }
    }
}

impl BroadcasterConfig {
    /// Create a configuration with no peers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer.
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peers.push(peer.into());
        self
    }

    /// Replace the peer list.
    pub fn with_peers(mut self, peers: Vec<String>) -> Self {
        self.peers = peers;
        self
    }

    /// Set the per-peer timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Normalize a peer address into a base URL without trailing slash.
fn peer_base_url(peer: &str) -> String {
    let trimmed = peer.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

/// Sends outbound messages to every configured peer over HTTP.
#[derive(Debug, Clone)]
pub struct PeerBroadcaster {
    client: reqwest::Client,
    peers: Arc<[String]>,
    request_timeout: Duration,
}

impl PeerBroadcaster {
    /// Create a broadcaster.
    pub fn new(config: BroadcasterConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            peers: config.peers.iter().map(|peer| peer_base_url(peer)).collect(),
            request_timeout: config.request_timeout,
        })
    }

    /// Configured peer base URLs.
    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    /// Send a message to every peer and wait for all of them.
    ///
    /// Never fails as a whole; per-peer failures are in the report.
    pub async fn broadcast(&self, message: &OutboundMessage) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        if self.peers.is_empty() {
            return report;
        }

        let body = match encode(message) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, message = message.type_name(), "Failed to encode outbound message");
                return report;
            }
        };

        let started = Instant::now();
        let endpoint = message.endpoint();
        let mut tasks = JoinSet::new();

        for peer in self.peers.iter().cloned() {
            let client = self.client.clone();
            let body = body.clone();
            let timeout = self.request_timeout;
            tasks.spawn(async move {
                let result = deliver(&client, &peer, endpoint, body, timeout).await;
                (peer, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((peer, Ok(()))) => report.delivered.push(peer),
                Ok((_, Err(failure))) => {
                    warn!(
                        peer = failure.peer(),
                        message = message.type_name(),
                        error = %failure,
                        "Peer delivery failed"
                    );
                    metrics::record_peer_failure(failure.kind());
                    report.failures.push(failure);
                }
                Err(e) => error!(error = ?e, "Broadcast task failed"),
            }
        }

        metrics::record_broadcast_latency(started.elapsed().as_secs_f64());
        debug!(
            message = message.type_name(),
            delivered = report.delivered.len(),
            failed = report.failures.len(),
            "Broadcast complete"
        );
        report
    }

    /// Broadcast in the background and return immediately.
    pub fn spawn_broadcast(&self, message: OutboundMessage) -> JoinHandle<BroadcastReport> {
        let broadcaster = self.clone();
        tokio::spawn(async move { broadcaster.broadcast(&message).await })
    }
}

impl MessageSink for PeerBroadcaster {
    fn send(&self, message: OutboundMessage) {
        if self.peers.is_empty() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(_) => {
                self.spawn_broadcast(message);
            }
            Err(_) => warn!(
                message = message.type_name(),
                "No async runtime available, dropping broadcast"
            ),
        }
    }

    fn peer_count(&self) -> usize {
        self.peers.len()
    }
}

fn encode(message: &OutboundMessage) -> Result<Bytes, serde_json::Error> {
    let body = match message {
        OutboundMessage::Proposal(request) => serde_json::to_vec(request)?,
        OutboundMessage::Vote(request) => serde_json::to_vec(request)?,
    };
    Ok(Bytes::from(body))
}

async fn deliver(
    client: &reqwest::Client,
    peer: &str,
    endpoint: &str,
    body: Bytes,
    timeout: Duration,
) -> Result<(), PeerError> {
    let url = format!("{peer}/api/v1/{endpoint}");
    let request = client
        .post(&url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body)
        .send();

    let response = match tokio::time::timeout(timeout, request).await {
        Err(_) => {
            return Err(PeerError::Timeout {
                peer: peer.to_string(),
                timeout,
            })
        }
        Ok(Err(e)) if e.is_timeout() => {
            return Err(PeerError::Timeout {
                peer: peer.to_string(),
                timeout,
            })
        }
        Ok(Err(e)) => {
            return Err(PeerError::Unreachable {
                peer: peer.to_string(),
                reason: e.to_string(),
            })
        }
        Ok(Ok(response)) => response,
    };

    if response.status().is_success() {
        Ok(())
    } else {
        Err(PeerError::Status {
            peer: peer.to_string(),
            status: response.status().as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_base_url_normalization() {
        assert_eq!(peer_base_url("10.0.0.1:8080"), "http://10.0.0.1:8080");
        assert_eq!(peer_base_url("http://node-b:8080/"), "http://node-b:8080");
        assert_eq!(peer_base_url(" https://node-c "), "https://node-c");
    }

    #[test]
    fn test_report_counts() {
        let report = BroadcastReport {
            delivered: vec!["http://a".into()],
            failures: vec![PeerError::Status {
                peer: "http://b".into(),
                status: 500,
            }],
        };
        assert_eq!(report.attempted(), 2);
        assert!(!report.all_delivered());
        assert_eq!(report.failures[0].kind(), "status");
        assert_eq!(report.failures[0].peer(), "http://b");
    }

    #[tokio::test]
    async fn test_no_peers_is_empty_report() {
        let broadcaster = PeerBroadcaster::new(BroadcasterConfig::new()).unwrap();
        let message = OutboundMessage::Vote(quorum_messages::CastVoteRequest {
            block_hash: "00".repeat(32),
            voter: "v0".into(),
        });

        let report = broadcaster.broadcast(&message).await;
        assert_eq!(report.attempted(), 0);
        assert_eq!(broadcaster.peer_count(), 0);
    }
}
