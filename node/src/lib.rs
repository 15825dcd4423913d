//! SDUPI node: round-based block production on a single-producer chain.
//!
//! The node:
//! - Admits transactions into a FIFO pool
//! - Drains a batch every round and builds a block off the async scheduler
//! - Appends to the in-memory ledger and announces blocks to peers
//! - Applies blocks, transactions and chains received from peers
//! - Tracks rolling throughput and Prometheus metrics

pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod mempool;
pub mod metrics;
pub mod node;
pub mod peer_connector;
pub mod peer_dispatch;
pub mod shutdown;
pub mod throughput;

pub use config::NodeConfig;
pub use context::{AdmitError, NodeContext};
pub use coordinator::{ConsensusCoordinator, RoundSettings};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use mempool::{MempoolEntry, PoolError, TransactionPool};
pub use metrics::NodeMetrics;
pub use node::{ChainStatus, Node, SubmitOutcome, TransactionLookup};
pub use peer_connector::{attach_peer, connect_to_peer, spawn_listener};
pub use peer_dispatch::{on_peer_message, DispatchOutcome};
pub use shutdown::ShutdownController;
pub use throughput::MetricsTracker;
