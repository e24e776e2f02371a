//! Production runner with async I/O.
//!
//! Wraps the synchronous consensus engine with everything a running
//! validator needs:
//!
//! - HTTP API for clients and peers (axum)
//! - Best-effort fan-out of proposals and votes to peers (reqwest)
//! - Periodic eviction of timed-out rounds (tokio interval)
//! - Prometheus metrics and OpenTelemetry tracing
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Validator Node                           │
//! │                                                                  │
//! │   RPC handlers ──► ConsensusService ──► ConsensusEngine          │
//! │        ▲                  │        (sync, returns actions)       │
//! │        │                  ▼                                      │
//! │   peers POST        PeerBroadcaster ──► peers /api/v1/...        │
//! │                           │                                      │
//! │   Sweeper (interval) ─────┘            metrics / tracing         │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never performs I/O. Every operation returns the broadcasts
//! and events it produced, and [`ConsensusService`] executes them: messages
//! go to the [`MessageSink`](quorum_core::MessageSink), events become
//! metrics.

mod broadcaster;
pub mod metrics;
pub mod rpc;
mod service;
mod sweeper;
pub mod telemetry;
mod verifier;

pub use broadcaster::{BroadcastReport, BroadcasterConfig, PeerBroadcaster, PeerError};
pub use service::ConsensusService;
pub use sweeper::spawn_sweeper;
pub use telemetry::{init_telemetry, TelemetryConfig, TelemetryError, TelemetryGuard};
pub use verifier::Ed25519Verifier;
