//! Background eviction of timed-out rounds.

use crate::ConsensusService;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Periodically evict proposals that outlived the round timeout.
///
/// Runs until the returned handle is aborted.
pub fn spawn_sweeper(service: Arc<ConsensusService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = interval.as_millis() as u64, "Round sweeper started");

        loop {
            ticker.tick().await;
            let evicted = service.evict_expired();
            if evicted > 0 {
                debug!(evicted, "Evicted expired proposals");
            }
        }
    })
}
