//! Test helpers for Quorum.
//!
//! Deterministic clocks, a message sink that records instead of sending,
//! and fixtures for validators and proposals (signed and unsigned).

use parking_lot::Mutex;
use quorum_core::{Clock, MessageSink, OutboundMessage};
use quorum_types::{BlockHeight, BlockProposal, KeyPair, Signature, ValidatorId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    /// Create a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Set the clock to an absolute reading.
    pub fn set(&self, now: Duration) {
        self.millis.store(now.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// A message sink that keeps everything it is given.
#[derive(Debug, Default)]
pub struct RecordingSink {
    peers: usize,
    sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingSink {
    /// Create a sink that reports `peers` peers.
    pub fn new(peers: usize) -> Self {
        Self {
            peers,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Messages sent so far.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().clone()
    }

    /// Remove and return messages sent so far.
    pub fn take(&self) -> Vec<OutboundMessage> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl MessageSink for RecordingSink {
    fn send(&self, message: OutboundMessage) {
        self.sent.lock().push(message);
    }

    fn peer_count(&self) -> usize {
        self.peers
    }
}

/// Validator addresses `v0..v{n-1}`.
pub fn validator_ids(n: usize) -> Vec<ValidatorId> {
    (0..n).map(|i| ValidatorId::new(format!("v{i}"))).collect()
}

/// Deterministic key pairs, one per validator index.
pub fn keypairs(n: usize) -> Vec<KeyPair> {
    (0..n)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[..8].copy_from_slice(&(i as u64 + 1).to_le_bytes());
            KeyPair::from_seed(&seed)
        })
        .collect()
}

/// An unsigned proposal whose hash is derived from its content.
pub fn proposal(height: u64, proposer: &str, payload: &[u8]) -> BlockProposal {
    BlockProposal::new(
        BlockHeight(height),
        ValidatorId::new(proposer),
        payload.to_vec(),
        Signature::empty(),
    )
}

/// A proposal signed by `key`, proposed under the key's address.
pub fn signed_proposal(key: &KeyPair, height: u64, payload: &[u8]) -> BlockProposal {
    let mut proposal = BlockProposal::new(
        BlockHeight(height),
        key.validator_id(),
        payload.to_vec(),
        Signature::empty(),
    );
    proposal.signature = key.sign(&proposal.signing_message());
    proposal
}
