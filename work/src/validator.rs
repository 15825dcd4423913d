//! Puzzle validation.

use sdupi_crypto::hash_block_header;
use sdupi_types::{BlockHash, TxHash};

use crate::DifficultyPrefix;

/// Whether `hash` meets `prefix`.
pub fn meets_prefix(hash: &BlockHash, prefix: &DifficultyPrefix) -> bool {
    hash.has_hex_prefix(prefix.as_str())
}

/// Recompute the header hash for `nonce` and check it against `prefix`.
pub fn validate_work(
    index: u64,
    previous_hash: &BlockHash,
    nonce: u64,
    merkle_root: &TxHash,
    prefix: &DifficultyPrefix,
) -> bool {
    meets_prefix(
        &hash_block_header(index, previous_hash, nonce, merkle_root),
        prefix,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_prefix_always_met() {
        let prefix = DifficultyPrefix::default();
        assert!(validate_work(1, &BlockHash::ZERO, 0, &TxHash::ZERO, &prefix));
        assert!(validate_work(9, &BlockHash::ZERO, 77, &TxHash::ZERO, &prefix));
    }

    #[test]
    fn full_length_prefix_of_own_hash_is_met() {
        let h = hash_block_header(3, &BlockHash::ZERO, 5, &TxHash::ZERO);
        let prefix = DifficultyPrefix::parse(&h.to_string()).unwrap();
        assert!(validate_work(3, &BlockHash::ZERO, 5, &TxHash::ZERO, &prefix));
        assert!(!validate_work(3, &BlockHash::ZERO, 6, &TxHash::ZERO, &prefix));
    }
}
