//! Shared state for RPC handlers.

use crate::ConsensusService;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

/// Shared state for RPC handlers.
#[derive(Clone)]
pub struct RpcState {
    /// Ready flag for readiness probe.
    pub ready: Arc<AtomicBool>,
    /// Consensus operations.
    pub service: Arc<ConsensusService>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl RpcState {
    /// Create state for a service, not yet ready.
    pub fn new(service: Arc<ConsensusService>) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            service,
            start_time: Instant::now(),
        }
    }
}
