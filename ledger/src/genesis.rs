//! Genesis block creation: the first block on each network.
//!
//! Genesis has index 0, a zero previous hash, no transactions, nonce 0, no
//! signature, and a fixed per-network timestamp so every node on a network
//! starts from the same block.

use sdupi_crypto::BlockSignature;
use sdupi_types::{BlockHash, NetworkId, Timestamp, TxHash};

use crate::Block;

/// Producer name recorded in the genesis block.
pub const GENESIS_PRODUCER: &str = "genesis";

/// Create the genesis block for a network.
pub fn create_genesis_block(network: NetworkId) -> Block {
    let mut block = Block {
        index: 0,
        timestamp: Timestamp::from_millis(network.genesis_timestamp_ms()),
        transactions: Vec::new(),
        previous_hash: BlockHash::ZERO,
        hash: BlockHash::ZERO,
        nonce: 0,
        producer: GENESIS_PRODUCER.to_string(),
        signature: BlockSignature::Unsigned,
        merkle_root: TxHash::ZERO,
    };
    block.hash = block.compute_hash();
    block
}

/// The genesis hash. The header hash does not cover the timestamp, so it is
/// the same on every network.
pub fn genesis_hash(network: NetworkId) -> BlockHash {
    create_genesis_block(network).hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_is_deterministic() {
        assert_eq!(create_genesis_block(NetworkId::Dev), create_genesis_block(NetworkId::Dev));
    }

    #[test]
    fn genesis_shape() {
        let g = create_genesis_block(NetworkId::Test);
        assert!(g.is_genesis());
        assert!(g.previous_hash.is_zero());
        assert!(g.transactions.is_empty());
        assert_eq!(g.nonce, 0);
        assert_eq!(g.producer, GENESIS_PRODUCER);
        assert_eq!(g.merkle_root, TxHash::ZERO);
        assert_eq!(g.hash, g.compute_hash());
        assert!(!g.hash.is_zero());
    }

    #[test]
    fn genesis_timestamp_per_network() {
        let live = create_genesis_block(NetworkId::Live);
        let dev = create_genesis_block(NetworkId::Dev);
        assert_ne!(live.timestamp, dev.timestamp);
        assert_eq!(genesis_hash(NetworkId::Live), genesis_hash(NetworkId::Dev));
    }
}
