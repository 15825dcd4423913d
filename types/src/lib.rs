//! Fundamental types for the SDUPI ledger node.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! block and transaction hashes, timestamps, key material, the network identifier,
//! and the shared error taxonomy.

pub mod block;
pub mod error;
pub mod hash;
pub mod keys;
pub mod network;
pub mod time;

pub use block::BlockHash;
pub use error::SdupiError;
pub use hash::{HashParseError, TxHash};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use network::NetworkId;
pub use time::Timestamp;
