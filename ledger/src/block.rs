//! The block format.

use sdupi_crypto::{block_signing_bytes, hash_block_header, merkle_root, BlockSignature};
use sdupi_transactions::Transaction;
use sdupi_types::{BlockHash, Timestamp, TxHash};
use serde::{Deserialize, Serialize};

/// Merkle root over the content hashes of `transactions`.
///
/// Leaves are recomputed rather than read from each stored `hash`, so editing
/// any content field changes the root.
pub fn transactions_root(transactions: &[Transaction]) -> TxHash {
    let leaves: Vec<TxHash> = transactions.iter().map(Transaction::compute_hash).collect();
    merkle_root(&leaves)
}

/// The index and hash of the block a new block builds on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainTip {
    pub index: u64,
    pub hash: BlockHash,
}

/// A block in the linear chain.
///
/// For an accepted block B with predecessor P:
/// - `B.index == P.index + 1`
/// - `B.previous_hash == P.hash`
/// - `B.merkle_root` is the Merkle root of `B.transactions`
/// - `B.hash == SHA-256(index ‖ previous_hash ‖ nonce ‖ merkle_root)`
/// - `B.signature` verifies for `B.producer` over `(index, previous_hash, merkle_root, timestamp)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: Timestamp,
    pub transactions: Vec<Transaction>,
    pub previous_hash: BlockHash,
    pub hash: BlockHash,
    pub nonce: u64,
    pub producer: String,
    pub signature: BlockSignature,
    pub merkle_root: TxHash,
}

impl Block {
    /// Recompute the header hash from the stored fields.
    pub fn compute_hash(&self) -> BlockHash {
        hash_block_header(self.index, &self.previous_hash, self.nonce, &self.merkle_root)
    }

    /// Recompute the Merkle root from the transactions' content.
    pub fn compute_merkle_root(&self) -> TxHash {
        transactions_root(&self.transactions)
    }

    /// The bytes the producer signs.
    pub fn signing_bytes(&self) -> [u8; 80] {
        block_signing_bytes(
            self.index,
            &self.previous_hash,
            &self.merkle_root,
            self.timestamp.as_millis(),
        )
    }

    pub fn verify_signature(&self) -> bool {
        self.signature.verify(&self.producer, &self.signing_bytes())
    }

    pub fn as_tip(&self) -> ChainTip {
        ChainTip {
            index: self.index,
            hash: self.hash,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}
