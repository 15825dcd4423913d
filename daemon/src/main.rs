//! SDUPI daemon: entry point for running an SDUPI node.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use sdupi_node::{init_logging, Node, NodeConfig};
use sdupi_types::NetworkId;
use sdupi_utils::{format_duration, format_millis};

#[derive(Parser)]
#[command(name = "sdupi-daemon", about = "SDUPI round-based ledger node")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "SDUPI_CONFIG")]
    config: Option<PathBuf>,

    /// Network to join: "live", "test", or "dev".
    #[arg(long, env = "SDUPI_NETWORK")]
    network: Option<NetworkId>,

    /// Port for peer connections (defaults to the network's port).
    #[arg(long, env = "SDUPI_PORT")]
    port: Option<u16>,

    /// Address the peer listener binds to.
    #[arg(long, env = "SDUPI_LISTEN_ADDRESS")]
    listen_address: Option<String>,

    /// Bootstrap peer addresses (comma-separated: "1.2.3.4:28545,5.6.7.8:28545").
    #[arg(long, env = "SDUPI_BOOTSTRAP_PEERS", value_delimiter = ',')]
    bootstrap_peers: Vec<String>,

    /// Maximum number of peer connections.
    #[arg(long, env = "SDUPI_MAX_PEERS")]
    max_peers: Option<usize>,

    /// Producer id used with keyed signatures.
    #[arg(long, env = "SDUPI_PRODUCER_ID")]
    producer_id: Option<String>,

    /// 64-char hex seed for the Ed25519 producer key.
    #[arg(long, env = "SDUPI_PRODUCER_SEED", hide_env_values = true)]
    producer_seed: Option<String>,

    /// Milliseconds between rounds.
    #[arg(long, env = "SDUPI_ROUND_MS")]
    round_duration_ms: Option<u64>,

    /// Maximum transactions per block.
    #[arg(long, env = "SDUPI_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Hex prefix block hashes must start with.
    #[arg(long, env = "SDUPI_DIFFICULTY")]
    difficulty_prefix: Option<String>,

    /// Cap on nonces tried per block.
    #[arg(long, env = "SDUPI_MAX_NONCE_ITERATIONS")]
    max_nonce_iterations: Option<u64>,

    /// Maximum pending transactions.
    #[arg(long, env = "SDUPI_POOL_CAPACITY")]
    pool_capacity: Option<usize>,

    /// Keep Prometheus gauges refreshed.
    #[arg(long, env = "SDUPI_ENABLE_METRICS")]
    metrics: bool,

    /// Log format: "human" or "json".
    #[arg(long, env = "SDUPI_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SDUPI_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Node operations.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Print the effective configuration as TOML and exit.
    #[command(name = "config")]
    Config,
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run the node until SIGINT/SIGTERM.
    Run,
}

impl Cli {
    /// File settings (or defaults) with CLI flags and env vars on top.
    fn node_config(&self) -> anyhow::Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path.to_string_lossy();
                NodeConfig::from_toml_file(&path)
                    .map_err(|e| anyhow::anyhow!("failed to load {path}: {e}"))?
            }
            None => NodeConfig::default(),
        };

        if let Some(network) = self.network {
            config.network = network;
            // A network switch without an explicit port follows the network.
            if self.port.is_none() && self.config.is_none() {
                config.port = network.default_port();
            }
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(addr) = &self.listen_address {
            config.listen_address = addr.clone();
        }
        if !self.bootstrap_peers.is_empty() {
            config.bootstrap_peers = self.bootstrap_peers.clone();
        }
        if let Some(max_peers) = self.max_peers {
            config.max_peers = max_peers;
        }
        if let Some(id) = &self.producer_id {
            config.producer_id = id.clone();
        }
        if let Some(seed) = &self.producer_seed {
            config.producer_seed = Some(seed.clone());
        }
        if let Some(ms) = self.round_duration_ms {
            config.round_duration_ms = ms;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(prefix) = &self.difficulty_prefix {
            config.difficulty_prefix = prefix.clone();
        }
        if let Some(cap) = self.max_nonce_iterations {
            config.max_nonce_iterations = cap;
        }
        if let Some(capacity) = self.pool_capacity {
            config.pool_capacity = capacity;
        }
        config.enable_metrics |= self.metrics;
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.node_config()?;

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string());
            Ok(())
        }
        Command::Node { action } => match action {
            NodeAction::Run => run(config).await,
        },
    }
}

async fn run(config: NodeConfig) -> anyhow::Result<()> {
    init_logging(config.log_format()?, &config.log_level)?;

    tracing::info!(
        network = %config.network,
        port = config.port,
        round = %format_millis(config.round_duration_ms),
        batch_size = config.batch_size,
        difficulty = %config.difficulty_prefix,
        consensus = %config.consensus_mode,
        "starting SDUPI node"
    );
    if !config.bootstrap_peers.is_empty() {
        tracing::info!(peers = %config.bootstrap_peers.join(", "), "bootstrap peers");
    }

    let status_every = Duration::from_millis(config.round_duration_ms.saturating_mul(15));
    let mut node = Node::new(config)?;
    node.start().await?;
    let started = Instant::now();

    let mut stop = node.shutdown_handle().subscribe();
    let shutdown = node.shutdown_handle();
    let signal = tokio::spawn(async move { shutdown.wait_for_signal().await });

    let mut status_tick = tokio::time::interval(status_every);
    status_tick.tick().await;
    loop {
        tokio::select! {
            _ = stop.recv() => break,
            _ = status_tick.tick() => {
                let status = node.get_chain_status().await;
                tracing::info!(
                    height = status.height,
                    pending = status.pending_count,
                    tps = status.throughput,
                    peers = status.peer_count,
                    "chain status"
                );
            }
        }
    }

    node.stop().await;
    signal.abort();
    let status = node.get_chain_status().await;
    tracing::info!(
        height = status.height,
        transactions = status.total_transactions,
        uptime = %format_duration(started.elapsed().as_secs()),
        "SDUPI node exited"
    );
    Ok(())
}
