//! Handles shared by the coordinator, peer tasks and the node façade.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use sdupi_ledger::{LedgerService, LedgerStore};
use sdupi_network::PeerBroadcaster;
use sdupi_transactions::Transaction;
use sdupi_types::{NetworkId, SdupiError, TxHash};
use sdupi_utils::Clock;

use crate::mempool::{PoolError, TransactionPool};
use crate::metrics::NodeMetrics;
use crate::throughput::MetricsTracker;

/// Why a transaction was not admitted to the pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmitError {
    #[error("transaction {0} is already confirmed")]
    AlreadyConfirmed(TxHash),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl From<AdmitError> for SdupiError {
    fn from(e: AdmitError) -> Self {
        match e {
            AdmitError::AlreadyConfirmed(_) => SdupiError::DuplicateTransaction,
            AdmitError::Pool(inner) => inner.into(),
        }
    }
}

/// All `Arc` fields are cheaply cloneable; clone the context into each task.
#[derive(Clone)]
pub struct NodeContext {
    pub network: NetworkId,
    pub ledger: LedgerService,
    pub pool: Arc<Mutex<TransactionPool>>,
    pub tracker: Arc<Mutex<MetricsTracker>>,
    pub peers: Arc<PeerBroadcaster>,
    pub metrics: Arc<NodeMetrics>,
    pub clock: Arc<dyn Clock>,
}

impl NodeContext {
    pub fn new(
        network: NetworkId,
        pool_capacity: usize,
        peer_queue_capacity: usize,
        max_peers: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            network,
            ledger: LedgerStore::shared(network),
            pool: Arc::new(Mutex::new(TransactionPool::new(pool_capacity, clock.clone()))),
            tracker: Arc::new(Mutex::new(MetricsTracker::new(clock.clone()))),
            peers: Arc::new(PeerBroadcaster::new(network, peer_queue_capacity, max_peers)),
            metrics: Arc::new(NodeMetrics::new()),
            clock,
        }
    }

    /// Admit a transaction to the pool unless it is already on chain.
    ///
    /// Does not announce it; callers decide whether and to whom.
    pub async fn admit_transaction(&self, transaction: Transaction) -> Result<TxHash, AdmitError> {
        let hash = transaction.hash;
        if self.ledger.read().await.contains_transaction(&hash) {
            self.metrics.transactions_rejected.inc();
            return Err(AdmitError::AlreadyConfirmed(hash));
        }
        let result = self.pool.lock().await.submit(transaction);
        match &result {
            Ok(_) => self.metrics.transactions_submitted.inc(),
            Err(_) => self.metrics.transactions_rejected.inc(),
        }
        Ok(result?)
    }

    /// Bring the gauges in line with current state.
    pub async fn refresh_gauges(&self) {
        let height = self.ledger.read().await.height();
        let pending = self.pool.lock().await.size();
        let peers = self.peers.peer_count().await;
        self.metrics.chain_height.set(height as i64);
        self.metrics.pending_transactions.set(pending as i64);
        self.metrics.peer_count.set(peers as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdupi_nullables::NullClock;
    use sdupi_transactions::TxKind;
    use sdupi_types::Timestamp;

    fn context() -> NodeContext {
        NodeContext::new(NetworkId::Dev, 2, 8, 8, Arc::new(NullClock::new(1_000)))
    }

    fn tx(n: u64) -> Transaction {
        Transaction::new("a", "b", n, TxKind::Transfer, Timestamp::from_millis(n))
    }

    #[tokio::test]
    async fn admit_counts_accepts_and_rejects() {
        let ctx = context();
        ctx.admit_transaction(tx(1)).await.unwrap();
        let dup = ctx.admit_transaction(tx(1)).await.unwrap_err();
        assert!(matches!(dup, AdmitError::Pool(PoolError::DuplicateHash(_))));
        assert_eq!(SdupiError::from(dup).code(), "duplicate_transaction");

        assert_eq!(ctx.metrics.transactions_submitted.get(), 1);
        assert_eq!(ctx.metrics.transactions_rejected.get(), 1);
    }

    #[tokio::test]
    async fn refresh_gauges_reflects_pool() {
        let ctx = context();
        ctx.admit_transaction(tx(1)).await.unwrap();
        ctx.refresh_gauges().await;
        assert_eq!(ctx.metrics.pending_transactions.get(), 1);
        assert_eq!(ctx.metrics.chain_height.get(), 0);
    }
}
