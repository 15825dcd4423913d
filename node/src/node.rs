//! The SDUPI node: wires pool, ledger, coordinator and peers together and
//! exposes the query and submission interface.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use sdupi_consensus::{RoundOutcome, RoundStats};
use sdupi_ledger::{Block, LedgerService};
use sdupi_transactions::{Transaction, TxKind};
use sdupi_types::{NetworkId, SdupiError, TxHash};
use sdupi_utils::{Clock, SystemClock};

use crate::config::NodeConfig;
use crate::context::NodeContext;
use crate::coordinator::{ConsensusCoordinator, RoundSettings};
use crate::error::NodeError;
use crate::metrics::NodeMetrics;
use crate::peer_connector::{connect_to_peer, spawn_listener};
use crate::shutdown::ShutdownController;

/// Timeout for waiting on background tasks during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a transaction submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub accepted: bool,
    pub hash: TxHash,
    /// Machine-readable rejection code, e.g. `"validation"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Where a transaction currently is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransactionLookup {
    Confirmed {
        transaction: Transaction,
        block_index: u64,
    },
    Pending {
        transaction: Transaction,
    },
}

impl TransactionLookup {
    pub fn transaction(&self) -> &Transaction {
        match self {
            Self::Confirmed { transaction, .. } | Self::Pending { transaction } => transaction,
        }
    }
}

/// Snapshot of chain and node state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainStatus {
    pub network: NetworkId,
    pub height: u64,
    pub total_transactions: u64,
    pub pending_count: usize,
    /// Confirmed transactions per second over the configured window.
    pub throughput: f64,
    pub peer_count: usize,
}

/// A running (or ready to run) SDUPI node.
pub struct Node {
    config: NodeConfig,
    ctx: NodeContext,
    coordinator: Arc<ConsensusCoordinator>,
    shutdown: ShutdownController,
    /// Handles for spawned background tasks (joined during shutdown).
    task_handles: Vec<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl Node {
    /// Validate `config` and build every component. Nothing runs until
    /// [`start`](Self::start).
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: NodeConfig, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        config.validate()?;
        let producer = Arc::new(config.producer()?);
        let ctx = NodeContext::new(
            config.network,
            config.pool_capacity,
            config.peer_queue_capacity,
            config.max_peers,
            clock,
        );
        let settings = RoundSettings {
            round_duration: Duration::from_millis(config.round_duration_ms),
            batch_size: config.batch_size,
            difficulty: config.difficulty()?,
            max_iterations: config.max_nonce_iterations,
        };
        let coordinator = Arc::new(ConsensusCoordinator::new(
            config.consensus_mode,
            ctx.clone(),
            producer,
            settings,
        )?);

        tracing::info!(
            network = %config.network,
            producer = %coordinator.producer().id(),
            scheme = ?config.signature_scheme,
            "node initialised"
        );

        Ok(Self {
            config,
            ctx,
            coordinator,
            shutdown: ShutdownController::new(),
            task_handles: Vec::new(),
            local_addr: None,
        })
    }

    /// Bind the peer listener, start the round scheduler and dial the
    /// bootstrap peers.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        if !self.task_handles.is_empty() {
            return Err(NodeError::AlreadyRunning);
        }

        let bind = format!("{}:{}", self.config.listen_address, self.config.port);
        let listener = TcpListener::bind(&bind).await?;
        let local_addr = listener.local_addr()?;
        self.local_addr = Some(local_addr);
        tracing::info!(addr = %local_addr, "peer listener bound");

        self.task_handles.push(spawn_listener(
            listener,
            self.ctx.clone(),
            self.shutdown.clone(),
        ));
        self.task_handles
            .push(self.coordinator.clone().spawn(self.shutdown.subscribe()));

        for addr in self.config.bootstrap_peers.clone() {
            let ctx = self.ctx.clone();
            let shutdown = self.shutdown.clone();
            self.task_handles.push(tokio::spawn(async move {
                if let Err(e) = connect_to_peer(&addr, &ctx, &shutdown).await {
                    tracing::warn!(peer = %addr, error = %e, "bootstrap peer unreachable");
                }
            }));
        }

        if self.config.enable_metrics {
            self.task_handles.push(self.spawn_metrics_refresh());
        }

        let height = self.ctx.ledger.read().await.height();
        tracing::info!(network = %self.config.network, height, "SDUPI node started");
        Ok(())
    }

    fn spawn_metrics_refresh(&self) -> JoinHandle<()> {
        let ctx = self.ctx.clone();
        let mut stop = self.shutdown.subscribe();
        let period = Duration::from_millis(self.config.round_duration_ms);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = stop.recv() => break,
                    _ = ticker.tick() => ctx.refresh_gauges().await,
                }
            }
        })
    }

    /// Signal every task to stop and wait for them, up to five seconds.
    pub async fn stop(&mut self) {
        tracing::info!("SDUPI node stopping");
        self.shutdown.shutdown();

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let wait_all = async {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all).await.is_err() {
            tracing::warn!(
                timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
                "shutdown timeout, some tasks may still be running"
            );
        }

        self.ctx.refresh_gauges().await;
        tracing::info!("SDUPI node stopped");
    }

    /// Create a transaction stamped now and admit it to the pool.
    ///
    /// Accepted transactions are announced to peers.
    pub async fn submit_transaction(
        &self,
        from: &str,
        to: &str,
        amount: u64,
        kind: TxKind,
    ) -> SubmitOutcome {
        let transaction = Transaction::new(from, to, amount, kind, self.ctx.clock.now());
        self.submit(transaction).await
    }

    /// Admit an already-built transaction (e.g. one carrying a signature).
    pub async fn submit(&self, transaction: Transaction) -> SubmitOutcome {
        let hash = transaction.hash;
        match self.ctx.admit_transaction(transaction.clone()).await {
            Ok(_) => {
                if let Err(e) = self.ctx.peers.announce_transaction(&transaction).await {
                    tracing::warn!(hash = %hash, error = %e, "failed to announce transaction");
                }
                tracing::debug!(hash = %hash, amount = transaction.amount, "transaction accepted");
                SubmitOutcome {
                    accepted: true,
                    hash,
                    code: None,
                    reason: None,
                }
            }
            Err(e) => {
                let reason = e.to_string();
                let code = SdupiError::from(e).code();
                tracing::debug!(hash = %hash, code, reason = %reason, "transaction rejected");
                SubmitOutcome {
                    accepted: false,
                    hash,
                    code: Some(code.to_string()),
                    reason: Some(reason),
                }
            }
        }
    }

    pub async fn get_block_by_index(&self, index: u64) -> Option<Block> {
        self.ctx.ledger.read().await.get_block(index).cloned()
    }

    /// Look a transaction up on chain first, then in the pool.
    pub async fn get_transaction_by_hash(&self, hash: &TxHash) -> Option<TransactionLookup> {
        {
            let ledger = self.ctx.ledger.read().await;
            if let (Some(transaction), Some(block_index)) =
                (ledger.get_transaction(hash), ledger.block_index_of(hash))
            {
                return Some(TransactionLookup::Confirmed {
                    transaction: transaction.clone(),
                    block_index,
                });
            }
        }
        self.ctx
            .pool
            .lock()
            .await
            .get(hash)
            .map(|entry| TransactionLookup::Pending {
                transaction: entry.transaction.clone(),
            })
    }

    pub async fn get_chain_status(&self) -> ChainStatus {
        let (height, total_transactions) = {
            let ledger = self.ctx.ledger.read().await;
            (ledger.height(), ledger.total_transactions())
        };
        let pending_count = self.ctx.pool.lock().await.size();
        let throughput = self
            .ctx
            .tracker
            .lock()
            .await
            .throughput(self.config.throughput_window_ms);
        let peer_count = self.ctx.peers.peer_count().await;
        ChainStatus {
            network: self.config.network,
            height,
            total_transactions,
            pending_count,
            throughput,
            peer_count,
        }
    }

    /// Run one round now, outside the scheduler.
    pub async fn run_round(&self) -> RoundOutcome {
        self.coordinator.run_round().await
    }

    pub async fn round_stats(&self) -> RoundStats {
        self.coordinator.stats().await
    }

    /// Dial a peer at runtime.
    pub async fn connect_peer(&self, addr: &str) -> Result<String, NodeError> {
        connect_to_peer(addr, &self.ctx, &self.shutdown).await
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn ledger(&self) -> LedgerService {
        self.ctx.ledger.clone()
    }

    pub fn metrics(&self) -> Arc<NodeMetrics> {
        self.ctx.metrics.clone()
    }

    pub fn producer_id(&self) -> &str {
        self.coordinator.producer().id()
    }

    /// Address the peer listener is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn shutdown_handle(&self) -> ShutdownController {
        self.shutdown.clone()
    }
}
