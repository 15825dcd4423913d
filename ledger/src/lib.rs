//! Linear block chain for the SDUPI ledger node.
//!
//! Blocks form a single chain rooted at a fixed genesis block. Each block
//! commits to its transactions with a Merkle root, links to its predecessor
//! by hash, carries the nonce found by the bounded puzzle and is signed by
//! its producer. The chain only grows; there is no fork choice or rollback.

pub mod block;
pub mod builder;
pub mod error;
pub mod genesis;
pub mod store;

pub use block::{transactions_root, Block, ChainTip};
pub use builder::{BlockBuilder, BuiltBlock};
pub use error::LedgerError;
pub use genesis::{create_genesis_block, genesis_hash, GENESIS_PRODUCER};
pub use store::{ChainExtension, LedgerService, LedgerStore};
