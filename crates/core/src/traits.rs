//! Collaborator traits supplied by the runner.

use crate::OutboundMessage;
use quorum_types::BlockProposal;
use std::time::{Duration, Instant};

/// A monotonic clock source for round timeouts.
pub trait Clock: Send + Sync {
    /// Time elapsed since some fixed epoch.
    fn now(&self) -> Duration;
}

/// Wall-clock time measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Create a clock whose epoch is now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Checks proposal signatures.
///
/// The engine never interprets signature bytes itself; installing a
/// verifier delegates that responsibility in.
pub trait SignatureVerifier: Send + Sync {
    /// Whether the proposal's signature is acceptable.
    fn verify_proposal(&self, proposal: &BlockProposal) -> bool;
}

/// Treats signatures as opaque bytes and accepts every proposal.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueSignatures;

impl SignatureVerifier for OpaqueSignatures {
    fn verify_proposal(&self, _proposal: &BlockProposal) -> bool {
        true
    }
}

/// Destination for outbound peer messages.
///
/// Implementations must not block: the runner calls this from request
/// handlers that still owe their caller a response.
pub trait MessageSink: Send + Sync {
    /// Hand a message off for delivery to every peer.
    fn send(&self, message: OutboundMessage);

    /// Number of peers messages are delivered to.
    fn peer_count(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
