//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};

use sdupi_consensus::ConsensusMode;
use sdupi_crypto::{ProducerIdentity, SignatureScheme};
use sdupi_types::NetworkId;
use sdupi_work::DifficultyPrefix;

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for an SDUPI node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Which network to join.
    #[serde(default)]
    pub network: NetworkId,

    /// Port to listen on for peer connections. 0 picks a free port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address the peer listener binds to.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Peers (`ip:port`) dialled on start-up and asked for their chain.
    #[serde(default)]
    pub bootstrap_peers: Vec<String>,

    /// Maximum number of peer connections.
    #[serde(default = "default_max_peers")]
    pub max_peers: usize,

    /// Producer id for keyed signatures. Ed25519 producers use the hex
    /// public key instead.
    #[serde(default = "default_producer_id")]
    pub producer_id: String,

    /// 64-char hex seed fixing the Ed25519 producer key. A random key is
    /// generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer_seed: Option<String>,

    #[serde(default)]
    pub signature_scheme: SignatureScheme,

    /// Interval between round ticks.
    #[serde(default = "default_round_duration_ms")]
    pub round_duration_ms: u64,

    /// Maximum transactions drained into one block.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Hex prefix the block hash must start with.
    #[serde(default = "default_difficulty_prefix")]
    pub difficulty_prefix: String,

    /// Cap on hashes tried per block before settling for the best one.
    #[serde(default = "default_max_nonce_iterations")]
    pub max_nonce_iterations: u64,

    /// Maximum pending transactions.
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,

    /// Window the reported throughput is averaged over.
    #[serde(default = "default_throughput_window_ms")]
    pub throughput_window_ms: u64,

    /// Outbound messages buffered per peer before new ones are dropped.
    #[serde(default = "default_peer_queue_capacity")]
    pub peer_queue_capacity: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to keep Prometheus metrics up to date.
    #[serde(default)]
    pub enable_metrics: bool,

    #[serde(default)]
    pub consensus_mode: ConsensusMode,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_port() -> u16 {
    NetworkId::Dev.default_port()
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_max_peers() -> usize {
    50
}

fn default_producer_id() -> String {
    "sdupi-node".to_string()
}

fn default_round_duration_ms() -> u64 {
    2_000
}

fn default_batch_size() -> usize {
    500
}

fn default_difficulty_prefix() -> String {
    "000".to_string()
}

fn default_max_nonce_iterations() -> u64 {
    200_000
}

fn default_pool_capacity() -> usize {
    10_000
}

fn default_throughput_window_ms() -> u64 {
    60_000
}

fn default_peer_queue_capacity() -> usize {
    1024
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }

    /// Check the values that serde cannot.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.difficulty()?;
        if self.batch_size == 0 {
            return Err(NodeError::Config("batch_size must be at least 1".into()));
        }
        if self.round_duration_ms == 0 {
            return Err(NodeError::Config(
                "round_duration_ms must be at least 1".into(),
            ));
        }
        if self.pool_capacity == 0 {
            return Err(NodeError::Config("pool_capacity must be at least 1".into()));
        }
        if self.peer_queue_capacity == 0 {
            return Err(NodeError::Config(
                "peer_queue_capacity must be at least 1".into(),
            ));
        }
        if self.throughput_window_ms == 0 {
            return Err(NodeError::Config(
                "throughput_window_ms must be at least 1".into(),
            ));
        }
        self.log_format()?;
        self.consensus_mode.ensure_supported()?;
        Ok(())
    }

    pub fn difficulty(&self) -> Result<DifficultyPrefix, NodeError> {
        Ok(DifficultyPrefix::parse(&self.difficulty_prefix)?)
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    /// Build the signing identity this node produces blocks with.
    pub fn producer(&self) -> Result<ProducerIdentity, NodeError> {
        Ok(ProducerIdentity::from_config(
            self.signature_scheme,
            &self.producer_id,
            self.producer_seed.as_deref(),
        )?)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: NetworkId::default(),
            port: default_port(),
            listen_address: default_listen_address(),
            bootstrap_peers: Vec::new(),
            max_peers: default_max_peers(),
            producer_id: default_producer_id(),
            producer_seed: None,
            signature_scheme: SignatureScheme::default(),
            round_duration_ms: default_round_duration_ms(),
            batch_size: default_batch_size(),
            difficulty_prefix: default_difficulty_prefix(),
            max_nonce_iterations: default_max_nonce_iterations(),
            pool_capacity: default_pool_capacity(),
            throughput_window_ms: default_throughput_window_ms(),
            peer_queue_capacity: default_peer_queue_capacity(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
            consensus_mode: ConsensusMode::default(),
        }
    }
}
