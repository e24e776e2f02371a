//! Production metrics using native Prometheus client.
//!
//! Metrics are domain-specific rather than generic event counters.
//! Use traces for event-level granularity during investigations.

use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Gauge, Histogram,
};
use std::sync::OnceLock;

static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Domain-specific metrics for production monitoring.
pub struct Metrics {
    // === Consensus ===
    pub blocks_finalized: Counter,
    pub block_height: Gauge,
    pub pending_proposals: Gauge,
    pub proposals_accepted: Counter,
    pub proposals_expired: Counter,
    pub votes_counted: Counter,

    // === Validator Set ===
    pub active_validators: Gauge,
    pub total_voting_power: Gauge,

    // === Network ===
    pub broadcasts_sent: CounterVec,
    pub broadcast_latency: Histogram,
    pub peer_failures: CounterVec,

    // === Errors ===
    pub proposals_rejected: CounterVec,
    pub votes_rejected: CounterVec,
}

impl Metrics {
    fn new() -> Self {
        Self {
            // Consensus
            blocks_finalized: register_counter!(
                "quorum_blocks_finalized_total",
                "Total number of blocks finalized"
            )
            .unwrap(),

            block_height: register_gauge!("quorum_block_height", "Height of the last finalized block")
                .unwrap(),

            pending_proposals: register_gauge!(
                "quorum_pending_proposals",
                "Number of proposals awaiting quorum"
            )
            .unwrap(),

            proposals_accepted: register_counter!(
                "quorum_proposals_accepted_total",
                "Total number of proposals accepted into voting"
            )
            .unwrap(),

            proposals_expired: register_counter!(
                "quorum_proposals_expired_total",
                "Total number of proposals evicted by round timeout"
            )
            .unwrap(),

            votes_counted: register_counter!(
                "quorum_votes_counted_total",
                "Total number of distinct votes counted"
            )
            .unwrap(),

            // Validator set
            active_validators: register_gauge!(
                "quorum_active_validators",
                "Number of active validators"
            )
            .unwrap(),

            total_voting_power: register_gauge!(
                "quorum_total_voting_power",
                "Total voting power of active validators"
            )
            .unwrap(),

            // Network
            broadcasts_sent: register_counter_vec!(
                "quorum_broadcasts_sent_total",
                "Messages handed to the peer broadcaster",
                &["message"]
            )
            .unwrap(),

            broadcast_latency: register_histogram!(
                "quorum_broadcast_latency_seconds",
                "Time to fan a message out to every peer",
                vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
            )
            .unwrap(),

            peer_failures: register_counter_vec!(
                "quorum_peer_failures_total",
                "Failed deliveries to individual peers",
                &["kind"]
            )
            .unwrap(),

            // Errors
            proposals_rejected: register_counter_vec!(
                "quorum_proposals_rejected_total",
                "Proposals rejected, by reason",
                &["reason"]
            )
            .unwrap(),

            votes_rejected: register_counter_vec!(
                "quorum_votes_rejected_total",
                "Votes rejected, by reason",
                &["reason"]
            )
            .unwrap(),
        }
    }
}

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}

/// Record a finalized block.
pub fn record_block_finalized(height: u64) {
    let m = metrics();
    m.blocks_finalized.inc();
    m.block_height.set(height as f64);
}

/// Record an accepted proposal.
pub fn record_proposal_accepted() {
    metrics().proposals_accepted.inc();
}

/// Record a rejected proposal.
pub fn record_proposal_rejected(reason: &str) {
    metrics()
        .proposals_rejected
        .with_label_values(&[reason])
        .inc();
}

/// Record a proposal evicted by timeout.
pub fn record_proposal_expired() {
    metrics().proposals_expired.inc();
}

/// Record a counted vote.
pub fn record_vote_counted() {
    metrics().votes_counted.inc();
}

/// Record a rejected vote.
pub fn record_vote_rejected(reason: &str) {
    metrics().votes_rejected.with_label_values(&[reason]).inc();
}

/// Set the number of pending proposals.
pub fn set_pending_proposals(count: usize) {
    metrics().pending_proposals.set(count as f64);
}

/// Set the active validator set size and power.
pub fn set_validator_set(count: usize, power: u64) {
    let m = metrics();
    m.active_validators.set(count as f64);
    m.total_voting_power.set(power as f64);
}

/// Record a message handed to the broadcaster.
pub fn record_broadcast(message: &str) {
    metrics()
        .broadcasts_sent
        .with_label_values(&[message])
        .inc();
}

/// Record how long a fan-out took.
pub fn record_broadcast_latency(latency_secs: f64) {
    metrics().broadcast_latency.observe(latency_secs);
}

/// Record a failed delivery to one peer.
pub fn record_peer_failure(kind: &str) {
    metrics().peer_failures.with_label_values(&[kind]).inc();
}
