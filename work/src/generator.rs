//! Nonce search (multi-threaded CPU, deterministic result).

use rayon::prelude::*;

use sdupi_crypto::hash_block_header;
use sdupi_types::{BlockHash, SdupiError, TxHash};

use crate::DifficultyPrefix;

/// Nonces hashed per parallel batch.
pub const DEFAULT_BATCH_SIZE: u64 = 4096;

/// Result of a bounded nonce search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkOutcome {
    pub nonce: u64,
    pub hash: BlockHash,
    /// Hashes a sequential scan would have computed to reach this result.
    pub iterations: u64,
    /// Leading hex characters of `hash` that match the prefix.
    pub matched: usize,
    pub met_target: bool,
}

impl WorkOutcome {
    /// The non-fatal timeout condition when the target was missed.
    pub fn timeout(&self) -> Option<SdupiError> {
        (!self.met_target).then_some(SdupiError::ConsensusTimeout {
            iterations: self.iterations,
        })
    }
}

/// Searches nonces `0, 1, 2, ...` for a block hash meeting a prefix.
///
/// Batches are scanned in parallel with rayon. The chosen nonce is always the
/// one a sequential scan would pick: the lowest nonce meeting the target, or
/// when the cap is hit, the longest matching prefix with the lowest nonce on
/// ties.
#[derive(Clone, Copy, Debug)]
pub struct WorkGenerator {
    batch_size: u64,
}

impl Default for WorkGenerator {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// (matched, nonce, hash)
type Candidate = (usize, u64, BlockHash);

fn better(a: Candidate, b: Candidate) -> Candidate {
    if a.0 > b.0 || (a.0 == b.0 && a.1 <= b.1) {
        a
    } else {
        b
    }
}

impl WorkGenerator {
    pub fn with_batch_size(batch_size: u64) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Search at most `max_iterations` nonces (at least one is always tried).
    pub fn search(
        &self,
        index: u64,
        previous_hash: &BlockHash,
        merkle_root: &TxHash,
        prefix: &DifficultyPrefix,
        max_iterations: u64,
    ) -> WorkOutcome {
        let target = prefix.as_str();
        let cap = max_iterations.max(1);
        let evaluate = |nonce: u64| -> Candidate {
            let hash = hash_block_header(index, previous_hash, nonce, merkle_root);
            (hash.matching_prefix_len(target), nonce, hash)
        };

        let mut best = evaluate(0);
        let mut start = 1u64;
        if best.0 < target.len() {
            while start < cap {
                let end = start.saturating_add(self.batch_size).min(cap);
                let batch_best = (start..end)
                    .into_par_iter()
                    .map(evaluate)
                    .reduce_with(better);
                if let Some(candidate) = batch_best {
                    best = better(best, candidate);
                }
                start = end;
                if best.0 == target.len() {
                    break;
                }
            }
        }

        let (matched, nonce, hash) = best;
        let met_target = matched == target.len();
        WorkOutcome {
            nonce,
            hash,
            iterations: if met_target { nonce + 1 } else { cap },
            matched,
            met_target,
        }
    }
}
