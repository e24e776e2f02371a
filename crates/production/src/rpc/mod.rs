//! HTTP RPC server for validator nodes.
//!
//! The same API serves clients and peers: a node forwards proposals and
//! votes by posting them to the endpoints below on every other node.
//!
//! # Health & Readiness
//!
//! - `GET /health` - Liveness probe (always returns 200 if server running)
//! - `GET /ready` - Readiness probe (200 once startup completed, 503 otherwise)
//!
//! # Metrics
//!
//! - `GET /metrics` - Prometheus metrics in text format
//!
//! # Consensus
//!
//! - `POST /api/v1/proposals` - Propose a block at a height
//! - `GET /api/v1/proposals/{hash}` - Pending proposal with its tally
//! - `POST /api/v1/votes` - Vote for a block hash
//! - `GET /api/v1/consensus` - Height, validator set and quorum summary
//!
//! # Validators
//!
//! - `POST /api/v1/validators` - Register or update a validator
//! - `GET /api/v1/validators` - List the validator set
//! - `DELETE /api/v1/validators/{address}` - Deactivate a validator
//!
//! Rejections map to distinct statuses: 403 for a non-validator, 409 for a
//! stale height, 400 for a malformed request and 401 for a bad signature.
//!
//! # Example
//!
//! ```no_run
//! use quorum_production::rpc::{RpcServer, RpcServerConfig};
//! # use quorum_production::ConsensusService;
//! # use std::sync::Arc;
//!
//! # async fn example(service: Arc<ConsensusService>) -> anyhow::Result<()> {
//! let config = RpcServerConfig {
//!     listen_addr: "0.0.0.0:8080".parse()?,
//! };
//!
//! let handle = RpcServer::new(config, service).start().await?;
//! handle.set_ready(true);
//! handle.join().await?;
//! # Ok(())
//! # }
//! ```

mod handlers;
mod routes;
mod server;
mod state;
mod types;

pub use handlers::status_for;
pub use routes::create_router;
pub use server::{RpcServer, RpcServerConfig, RpcServerError, RpcServerHandle};
pub use state::RpcState;
pub use types::*;
