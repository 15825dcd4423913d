//! Block assembly: Merkle commitment, nonce search and producer signature.

use std::sync::Arc;

use sdupi_crypto::{BlockSignature, ProducerIdentity};
use sdupi_transactions::Transaction;
use sdupi_utils::Clock;
use sdupi_work::{DifficultyPrefix, WorkGenerator, WorkOutcome};

use crate::block::{transactions_root, Block, ChainTip};

/// A freshly built candidate and the search that produced it.
#[derive(Clone, Debug)]
pub struct BuiltBlock {
    pub block: Block,
    pub work: WorkOutcome,
}

impl BuiltBlock {
    /// `false` when the iteration cap was hit and the best nonce was used.
    pub fn met_target(&self) -> bool {
        self.work.met_target
    }
}

/// Builds candidate blocks on top of a chain tip.
///
/// Pure computation apart from reading the clock for the block timestamp.
/// Callers run it off the async scheduler since the nonce search is CPU bound.
pub struct BlockBuilder {
    generator: WorkGenerator,
    clock: Arc<dyn Clock>,
}

impl BlockBuilder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            generator: WorkGenerator::default(),
            clock,
        }
    }

    pub fn with_generator(mut self, generator: WorkGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Build the block following `previous` from `transactions`, in order.
    pub fn build(
        &self,
        previous: ChainTip,
        transactions: Vec<Transaction>,
        producer: &ProducerIdentity,
        difficulty: &DifficultyPrefix,
        max_iterations: u64,
    ) -> BuiltBlock {
        let index = previous.index + 1;
        let root = transactions_root(&transactions);

        let work = self
            .generator
            .search(index, &previous.hash, &root, difficulty, max_iterations);

        tracing::debug!(
            index,
            nonce = work.nonce,
            iterations = work.iterations,
            met_target = work.met_target,
            "nonce search finished"
        );

        let mut block = Block {
            index,
            timestamp: self.clock.now(),
            transactions,
            previous_hash: previous.hash,
            hash: work.hash,
            nonce: work.nonce,
            producer: producer.id().to_string(),
            signature: BlockSignature::Unsigned,
            merkle_root: root,
        };
        block.signature = producer.sign(&block.signing_bytes());

        BuiltBlock { block, work }
    }
}
