//! Transaction pool: validated transactions waiting for a block.
//!
//! Strict FIFO with a hard capacity. A full pool rejects new submissions;
//! nothing is ever evicted.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use thiserror::Error;

use sdupi_transactions::{validate_transaction, Transaction, TransactionError};
use sdupi_types::{SdupiError, Timestamp, TxHash};
use sdupi_utils::Clock;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("malformed transaction: {0}")]
    Malformed(#[from] TransactionError),

    #[error("transaction {0} is already pending")]
    DuplicateHash(TxHash),

    #[error("pool is full ({capacity} transactions)")]
    CapacityExceeded { capacity: usize },
}

impl PoolError {
    /// Short machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::DuplicateHash(_) => "duplicate_hash",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
        }
    }
}

impl From<PoolError> for SdupiError {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::Malformed(inner) => inner.into(),
            PoolError::DuplicateHash(_) => SdupiError::DuplicateTransaction,
            PoolError::CapacityExceeded { capacity } => {
                SdupiError::CapacityExceeded { limit: capacity }
            }
        }
    }
}

/// A pending transaction and when it arrived.
#[derive(Clone, Debug)]
pub struct MempoolEntry {
    pub transaction: Transaction,
    pub arrived: Timestamp,
}

pub struct TransactionPool {
    entries: HashMap<TxHash, MempoolEntry>,
    /// Arrival order; every hash here has an entry.
    order: VecDeque<TxHash>,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl TransactionPool {
    pub fn new(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
            clock,
        }
    }

    /// Validate and enqueue a transaction.
    pub fn submit(&mut self, transaction: Transaction) -> Result<TxHash, PoolError> {
        validate_transaction(&transaction)?;
        let hash = transaction.hash;
        if self.entries.contains_key(&hash) {
            return Err(PoolError::DuplicateHash(hash));
        }
        if self.entries.len() >= self.capacity {
            return Err(PoolError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.entries.insert(
            hash,
            MempoolEntry {
                transaction,
                arrived: self.clock.now(),
            },
        );
        self.order.push_back(hash);
        Ok(hash)
    }

    /// Remove up to `max_count` transactions, oldest first.
    pub fn drain_batch(&mut self, max_count: usize) -> Vec<Transaction> {
        let take = max_count.min(self.order.len());
        let mut batch = Vec::with_capacity(take);
        for hash in self.order.drain(..take) {
            if let Some(entry) = self.entries.remove(&hash) {
                batch.push(entry.transaction);
            }
        }
        batch
    }

    /// Put transactions back at the head of the queue in their given order.
    ///
    /// Hashes already pooled are skipped. The capacity limit does not apply.
    /// Returns how many were requeued.
    pub fn requeue_front(&mut self, transactions: Vec<Transaction>) -> usize {
        let now = self.clock.now();
        let mut requeued = 0;
        for transaction in transactions.into_iter().rev() {
            let hash = transaction.hash;
            if self.entries.contains_key(&hash) {
                continue;
            }
            self.entries.insert(
                hash,
                MempoolEntry {
                    transaction,
                    arrived: now,
                },
            );
            self.order.push_front(hash);
            requeued += 1;
        }
        requeued
    }

    /// Drop pending transactions that were confirmed elsewhere.
    pub fn remove_confirmed<'a>(&mut self, hashes: impl IntoIterator<Item = &'a TxHash>) -> usize {
        let before = self.entries.len();
        for hash in hashes {
            self.entries.remove(hash);
        }
        let removed = before - self.entries.len();
        if removed > 0 {
            let entries = &self.entries;
            self.order.retain(|hash| entries.contains_key(hash));
        }
        removed
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, hash: &TxHash) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn get(&self, hash: &TxHash) -> Option<&MempoolEntry> {
        self.entries.get(hash)
    }
}
