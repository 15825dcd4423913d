use thiserror::Error;

use crate::mempool::PoolError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("ledger error: {0}")]
    Ledger(#[from] sdupi_ledger::LedgerError),

    #[error("network error: {0}")]
    Network(#[from] sdupi_network::NetworkError),

    #[error("consensus error: {0}")]
    Consensus(#[from] sdupi_consensus::ConsensusError),

    #[error("message error: {0}")]
    Message(#[from] sdupi_messages::MessageError),

    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("invalid transaction: {0}")]
    Transaction(#[from] sdupi_transactions::TransactionError),

    #[error("work error: {0}")]
    Work(#[from] sdupi_work::WorkError),

    #[error("producer error: {0}")]
    Producer(#[from] sdupi_crypto::ProducerError),

    #[error("config error: {0}")]
    Config(String),

    #[error("node is already running")]
    AlreadyRunning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
