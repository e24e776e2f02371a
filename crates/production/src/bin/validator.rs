//! Quorum Validator Node
//!
//! Production binary for running a validator node.
//!
//! # Usage
//!
//! ```bash
//! # Start with configuration file
//! quorum-validator --config validator.toml
//!
//! # Override listen address and add peers
//! quorum-validator --config validator.toml --listen 0.0.0.0:8081 \
//!     --peer http://10.0.0.2:8080 --peer http://10.0.0.3:8080
//! ```
//!
//! # Configuration
//!
//! See `ValidatorConfig` for all configuration options. Example TOML:
//!
//! ```toml
//! [node]
//! address = "validator-a"
//! key_path = "./validator.key"
//!
//! [rpc]
//! listen_addr = "0.0.0.0:8080"
//!
//! [network]
//! peers = ["http://10.0.0.2:8080", "http://10.0.0.3:8080"]
//! request_timeout_ms = 2000
//!
//! [consensus]
//! round_timeout_ms = 30000
//! eviction_interval_ms = 1000
//! finalized_history = 1024
//! verify_signatures = false
//!
//! [telemetry]
//! otlp_endpoint = "http://localhost:4317"
//! sampling_ratio = 1.0
//!
//! [[genesis.validators]]
//! address = "validator-a"
//! voting_power = 1
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use quorum_bft::{ConsensusConfig, ConsensusEngine, ValidatorRegistry};
use quorum_production::rpc::{RpcServer, RpcServerConfig};
use quorum_production::{
    init_telemetry, spawn_sweeper, BroadcasterConfig, ConsensusService, Ed25519Verifier,
    PeerBroadcaster, TelemetryConfig,
};
use quorum_types::{KeyPair, ValidatorId};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

/// Quorum Validator Node
///
/// Runs a validator participating in round-based quorum voting.
#[derive(Parser, Debug)]
#[command(name = "quorum-validator")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: PathBuf,

    /// RPC listen address (overrides config)
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Peer base URLs (can be specified multiple times)
    #[arg(long = "peer")]
    peers: Vec<String>,

    /// Log level filter (overrides config, RUST_LOG still wins)
    #[arg(long)]
    log_level: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════

/// Top-level validator configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ValidatorConfig {
    /// Node identity configuration
    #[serde(default)]
    pub node: NodeConfig,

    /// RPC server configuration
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Peer configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Consensus configuration
    #[serde(default)]
    pub consensus: ConsensusToml,

    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: TelemetryToml,

    /// Genesis configuration (initial validator set)
    #[serde(default)]
    pub genesis: GenesisConfig,
}

/// Node identity configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NodeConfig {
    /// Validator address of this node. Derived from the key when absent.
    #[serde(default)]
    pub address: Option<String>,

    /// Path to the signing key seed
    #[serde(default)]
    pub key_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_addr")]
    pub listen_addr: SocketAddr,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_rpc_addr(),
        }
    }
}

fn default_rpc_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Peer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Peer base URLs
    #[serde(default)]
    pub peers: Vec<String>,

    /// Per-peer request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            peers: Vec::new(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    2_000
}

/// Consensus configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusToml {
    #[serde(default = "default_round_timeout_ms")]
    pub round_timeout_ms: u64,

    #[serde(default = "default_eviction_interval_ms")]
    pub eviction_interval_ms: u64,

    #[serde(default = "default_finalized_history")]
    pub finalized_history: usize,

    /// Require Ed25519 proposer signatures (addresses must be hex public keys)
    #[serde(default)]
    pub verify_signatures: bool,
}

impl Default for ConsensusToml {
    fn default() -> Self {
        Self {
            round_timeout_ms: default_round_timeout_ms(),
            eviction_interval_ms: default_eviction_interval_ms(),
            finalized_history: default_finalized_history(),
            verify_signatures: false,
        }
    }
}

fn default_round_timeout_ms() -> u64 {
    30_000
}

fn default_eviction_interval_ms() -> u64 {
    1_000
}

fn default_finalized_history() -> usize {
    1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryToml {
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,

    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for TelemetryToml {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            sampling_ratio: default_sampling_ratio(),
            service_name: default_service_name(),
        }
    }
}

fn default_sampling_ratio() -> f64 {
    1.0
}

fn default_service_name() -> String {
    "quorum-validator".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GenesisConfig {
    #[serde(default)]
    pub validators: Vec<ValidatorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorEntry {
    pub address: String,

    #[serde(default = "default_voting_power")]
    pub voting_power: u64,
}

fn default_voting_power() -> u64 {
    1
}

impl ValidatorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(listen) = cli.listen {
            self.rpc.listen_addr = listen;
        }

        if !cli.peers.is_empty() {
            self.network.peers.extend(cli.peers.iter().cloned());
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Startup helpers
// ═══════════════════════════════════════════════════════════════════════════

fn load_or_generate_keypair(key_path: Option<&Path>) -> Result<Option<KeyPair>> {
    let Some(path) = key_path else {
        return Ok(None);
    };

    if path.exists() {
        let key_bytes = fs::read(path)
            .with_context(|| format!("Failed to read key file: {}", path.display()))?;
        let key_bytes = trim_ascii(&key_bytes);

        let decoded = if key_bytes.len() == 64 {
            hex::decode(key_bytes).context("Failed to decode hex key")?
        } else if key_bytes.len() == 32 {
            key_bytes.to_vec()
        } else {
            bail!(
                "Invalid key file size: expected 32 bytes (raw) or 64 hex chars, got {} bytes",
                key_bytes.len()
            );
        };

        let seed: [u8; 32] = decoded
            .try_into()
            .map_err(|_| anyhow::anyhow!("Key must be exactly 32 bytes"))?;

        Ok(Some(KeyPair::from_seed(&seed)))
    } else {
        info!("Key file not found, generating new keypair");

        let mut seed = [0u8; 32];
        use rand::RngCore;
        rand::rngs::OsRng.fill_bytes(&mut seed);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, hex::encode(seed))?;
        info!("Saved new keypair seed to {}", path.display());

        Ok(Some(KeyPair::from_seed(&seed)))
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    match std::str::from_utf8(bytes) {
        Ok(text) if text.trim().len() == 64 => text.trim().as_bytes(),
        _ => bytes,
    }
}

fn local_address(config: &NodeConfig, keypair: Option<&KeyPair>) -> Option<ValidatorId> {
    match (&config.address, keypair) {
        (Some(address), _) => Some(ValidatorId::new(address.clone())),
        (None, Some(keypair)) => Some(keypair.validator_id()),
        (None, None) => None,
    }
}

fn build_registry(
    config: &GenesisConfig,
    local: Option<&ValidatorId>,
) -> Result<Arc<ValidatorRegistry>> {
    let entries: Vec<(ValidatorId, u64)> = if config.validators.is_empty() {
        match local {
            Some(id) => {
                warn!("No validators in genesis config, running in single-validator mode");
                vec![(id.clone(), 1)]
            }
            None => bail!("No genesis validators and no local address configured"),
        }
    } else {
        config
            .validators
            .iter()
            .map(|v| (ValidatorId::new(v.address.clone()), v.voting_power))
            .collect()
    };

    let registry =
        ValidatorRegistry::with_validators(entries).context("Invalid genesis validator")?;
    Ok(Arc::new(registry))
}

fn build_consensus_config(config: &ConsensusToml, local: Option<ValidatorId>) -> ConsensusConfig {
    let mut consensus = ConsensusConfig::new()
        .with_round_timeout(Duration::from_millis(config.round_timeout_ms))
        .with_finalized_history(config.finalized_history);
    if let Some(id) = local {
        consensus = consensus.with_local_validator(id);
    }
    consensus
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ValidatorConfig::load(&cli.config)?;
    config.apply_overrides(&cli);

    let mut telemetry_config = TelemetryConfig {
        service_name: config.telemetry.service_name.clone(),
        otlp_endpoint: config.telemetry.otlp_endpoint.clone(),
        sampling_ratio: config.telemetry.sampling_ratio,
        ..TelemetryConfig::default()
    };
    if let Some(level) = &cli.log_level {
        telemetry_config.log_filter = level.clone();
    }

    let keypair = load_or_generate_keypair(config.node.key_path.as_deref())?;
    let local = local_address(&config.node, keypair.as_ref());
    if let Some(id) = &local {
        telemetry_config
            .resource_attributes
            .push(("validator".to_string(), id.to_string()));
    }
    let telemetry = init_telemetry(&telemetry_config)?;

    info!(
        validator = local.as_ref().map(|id| id.as_str()).unwrap_or("observer"),
        listen = %config.rpc.listen_addr,
        peers = config.network.peers.len(),
        exporting = telemetry.exporting(),
        "Quorum validator starting"
    );

    let registry = build_registry(&config.genesis, local.as_ref())?;
    info!(
        validators = registry.active_count(),
        total_power = registry.total_active_power(),
        quorum_threshold = registry.quorum_threshold(),
        "Validator set initialized"
    );

    let mut engine = ConsensusEngine::new(
        build_consensus_config(&config.consensus, local.clone()),
        registry,
    );
    if config.consensus.verify_signatures {
        info!("Proposer signature verification enabled");
        engine = engine.with_verifier(Arc::new(Ed25519Verifier));
    }

    let broadcaster = PeerBroadcaster::new(
        BroadcasterConfig::new()
            .with_peers(config.network.peers.clone())
            .with_request_timeout(Duration::from_millis(config.network.request_timeout_ms)),
    )
    .context("Failed to build HTTP client")?;

    let service = Arc::new(ConsensusService::new(
        Arc::new(engine),
        Arc::new(broadcaster),
    ));

    let sweeper = spawn_sweeper(
        service.clone(),
        Duration::from_millis(config.consensus.eviction_interval_ms.max(1)),
    );

    let rpc_config = RpcServerConfig {
        listen_addr: config.rpc.listen_addr,
    };
    let rpc_handle = RpcServer::new(rpc_config, service)
        .start()
        .await
        .context("Failed to start RPC server")?;
    rpc_handle.set_ready(true);

    info!("Validator node started, press Ctrl+C to stop");
    shutdown_signal().await;

    info!("Initiating graceful shutdown...");
    rpc_handle.set_ready(false);
    rpc_handle.abort();
    sweeper.abort();
    telemetry.shutdown().await;

    info!("Validator shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_full_config_parses() {
        let toml = r#"
            [node]
            address = "validator-a"

            [rpc]
            listen_addr = "127.0.0.1:9000"

            [network]
            peers = ["http://10.0.0.2:8080"]
            request_timeout_ms = 500

            [consensus]
            round_timeout_ms = 5000
            verify_signatures = true

            [telemetry]
            sampling_ratio = 0.5

            [[genesis.validators]]
            address = "validator-a"
            voting_power = 2

            [[genesis.validators]]
            address = "validator-b"
        "#;

        let config: ValidatorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.node.address.as_deref(), Some("validator-a"));
        assert_eq!(config.rpc.listen_addr.port(), 9000);
        assert_eq!(config.network.peers.len(), 1);
        assert_eq!(config.network.request_timeout_ms, 500);
        assert_eq!(config.consensus.round_timeout_ms, 5000);
        assert_eq!(config.consensus.eviction_interval_ms, 1000);
        assert!(config.consensus.verify_signatures);
        assert_eq!(config.telemetry.sampling_ratio, 0.5);
        assert_eq!(config.genesis.validators.len(), 2);
        assert_eq!(config.genesis.validators[1].voting_power, 1);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: ValidatorConfig = toml::from_str("").unwrap();
        assert_eq!(config.rpc.listen_addr.port(), 8080);
        assert_eq!(config.network.request_timeout_ms, 2000);
        assert_eq!(config.consensus.finalized_history, 1024);
        assert!(config.node.address.is_none());
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = ValidatorConfig::default();
        let cli = Cli::parse_from([
            "quorum-validator",
            "--config",
            "validator.toml",
            "--listen",
            "127.0.0.1:7000",
            "--peer",
            "http://a:8080",
            "--peer",
            "http://b:8080",
        ]);

        config.apply_overrides(&cli);
        assert_eq!(config.rpc.listen_addr.port(), 7000);
        assert_eq!(config.network.peers, vec!["http://a:8080", "http://b:8080"]);
    }

    #[test]
    fn test_genesis_registry() {
        let genesis = GenesisConfig {
            validators: vec![
                ValidatorEntry {
                    address: "a".into(),
                    voting_power: 2,
                },
                ValidatorEntry {
                    address: "b".into(),
                    voting_power: 1,
                },
            ],
        };
        let registry = build_registry(&genesis, None).unwrap();
        assert_eq!(registry.total_active_power(), 3);

        let single = build_registry(&GenesisConfig::default(), Some(&ValidatorId::new("me")))
            .unwrap();
        assert!(single.is_active(&ValidatorId::new("me")));

        assert!(build_registry(&GenesisConfig::default(), None).is_err());

        let zero = GenesisConfig {
            validators: vec![ValidatorEntry {
                address: "z".into(),
                voting_power: 0,
            }],
        };
        assert!(build_registry(&zero, None).is_err());
    }

    #[test]
    fn test_keypair_generated_then_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("validator.key");

        let first = load_or_generate_keypair(Some(&path)).unwrap().unwrap();
        assert!(path.exists());
        let second = load_or_generate_keypair(Some(&path)).unwrap().unwrap();
        assert_eq!(first.validator_id(), second.validator_id());

        let node = NodeConfig {
            address: None,
            key_path: Some(path),
        };
        assert_eq!(local_address(&node, Some(&first)), Some(first.validator_id()));
    }

    #[test]
    fn test_invalid_key_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"short").unwrap();

        assert!(load_or_generate_keypair(Some(file.path())).is_err());
        assert!(load_or_generate_keypair(None).unwrap().is_none());
    }
}
