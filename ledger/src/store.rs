//! In-memory ledger store.
//!
//! Owns the chain and a transaction hash index. Every append is validated
//! against the current tip; nothing is persisted.

use std::collections::HashMap;
use std::sync::Arc;

use sdupi_transactions::{validate_transaction, Transaction};
use sdupi_types::{NetworkId, TxHash};
use tokio::sync::RwLock;

use crate::block::{Block, ChainTip};
use crate::error::LedgerError;
use crate::genesis::create_genesis_block;

/// The single shared ledger handle passed to every component.
pub type LedgerService = Arc<RwLock<LedgerStore>>;

/// Where a confirmed transaction lives: block index and position in the block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TxLocation {
    block: u64,
    position: usize,
}

/// Result of applying a peer's chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainExtension {
    pub appended: usize,
    /// The first block that was rejected, if any, and why.
    pub stopped_at: Option<(u64, LedgerError)>,
}

/// The chain, starting at genesis.
pub struct LedgerStore {
    network: NetworkId,
    blocks: Vec<Block>,
    tx_index: HashMap<TxHash, TxLocation>,
    total_transactions: u64,
}

impl LedgerStore {
    /// A ledger holding only the network's genesis block.
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            blocks: vec![create_genesis_block(network)],
            tx_index: HashMap::new(),
            total_transactions: 0,
        }
    }

    /// Wrap in the shared handle.
    pub fn shared(network: NetworkId) -> LedgerService {
        Arc::new(RwLock::new(Self::new(network)))
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }

    /// Validate `candidate` against the tip and append it.
    ///
    /// Checks, in order: index, previous hash, Merkle root, header hash,
    /// producer signature, then each transaction's structure and that none is
    /// already on chain. The ledger is unchanged on error.
    pub fn append(&mut self, candidate: Block) -> Result<(), LedgerError> {
        validate_link(self.tip(), &candidate)?;
        self.validate_transactions(&candidate)?;

        let block_index = candidate.index;
        for (position, tx) in candidate.transactions.iter().enumerate() {
            self.tx_index.insert(
                tx.hash,
                TxLocation {
                    block: block_index,
                    position,
                },
            );
        }
        self.total_transactions += candidate.transactions.len() as u64;
        tracing::debug!(
            index = block_index,
            hash = %candidate.hash,
            transactions = candidate.transactions.len(),
            "block appended"
        );
        self.blocks.push(candidate);
        Ok(())
    }

    fn validate_transactions(&self, block: &Block) -> Result<(), LedgerError> {
        let mut seen = std::collections::HashSet::with_capacity(block.transactions.len());
        for tx in &block.transactions {
            if let Err(e) = validate_transaction(tx) {
                return Err(LedgerError::InvalidTransaction {
                    index: block.index,
                    hash: tx.hash.to_string(),
                    reason: e.to_string(),
                });
            }
            if self.tx_index.contains_key(&tx.hash) || !seen.insert(tx.hash) {
                return Err(LedgerError::DuplicateTransaction {
                    index: block.index,
                    hash: tx.hash.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn get_block(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    pub fn get_transaction(&self, hash: &TxHash) -> Option<&Transaction> {
        let loc = self.tx_index.get(hash)?;
        self.get_block(loc.block)?.transactions.get(loc.position)
    }

    /// Index of the block that confirmed `hash`.
    pub fn block_index_of(&self, hash: &TxHash) -> Option<u64> {
        self.tx_index.get(hash).map(|loc| loc.block)
    }

    pub fn contains_transaction(&self, hash: &TxHash) -> bool {
        self.tx_index.contains_key(hash)
    }

    /// Index of the tip. A genesis-only ledger has height 0.
    pub fn height(&self) -> u64 {
        self.tip().index
    }

    pub fn tip(&self) -> &Block {
        // `blocks` always holds at least genesis.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn chain_tip(&self) -> ChainTip {
        self.tip().as_tip()
    }

    /// The full chain, genesis first.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn total_transactions(&self) -> u64 {
        self.total_transactions
    }

    /// Re-check genesis and every link of the stored chain.
    pub fn verify_chain(&self) -> Result<(), LedgerError> {
        let genesis = create_genesis_block(self.network);
        if self.blocks[0] != genesis {
            return Err(LedgerError::InvalidHash { index: 0 });
        }
        for pair in self.blocks.windows(2) {
            validate_link(&pair[0], &pair[1])?;
        }
        Ok(())
    }

    /// Apply a peer's chain: append every block above the local height in
    /// order, stopping at the first rejection. No fork choice.
    pub fn extend_from(&mut self, blocks: &[Block]) -> ChainExtension {
        let mut result = ChainExtension::default();
        let height = self.height();
        for block in blocks.iter().filter(|b| b.index > height) {
            let index = block.index;
            match self.append(block.clone()) {
                Ok(()) => result.appended += 1,
                Err(e) => {
                    result.stopped_at = Some((index, e));
                    break;
                }
            }
        }
        result
    }
}

/// Check that `block` correctly follows `previous`.
pub(crate) fn validate_link(previous: &Block, block: &Block) -> Result<(), LedgerError> {
    let expected = previous.index + 1;
    if block.index != expected {
        return Err(LedgerError::InvalidIndex {
            expected,
            actual: block.index,
        });
    }
    if block.previous_hash != previous.hash {
        return Err(LedgerError::InvalidPreviousHash {
            index: block.index,
            expected: previous.hash.to_string(),
            actual: block.previous_hash.to_string(),
        });
    }
    if block.merkle_root != block.compute_merkle_root() {
        return Err(LedgerError::InvalidMerkleRoot { index: block.index });
    }
    if block.hash != block.compute_hash() {
        return Err(LedgerError::InvalidHash { index: block.index });
    }
    if !block.verify_signature() {
        return Err(LedgerError::InvalidSignature {
            index: block.index,
            producer: block.producer.clone(),
        });
    }
    Ok(())
}
