//! Merkle root over transaction hashes.

use sdupi_types::TxHash;

use crate::hash::sha256_multi;

/// Compute the Merkle root of an ordered list of transaction hashes.
///
/// Each level hashes adjacent pairs `SHA-256(left ‖ right)`; an odd last
/// element is paired with itself. An empty list yields the all-zero hash and
/// a single hash is its own root.
pub fn merkle_root(leaves: &[TxHash]) -> TxHash {
    match leaves.len() {
        0 => return TxHash::ZERO,
        1 => return leaves[0],
        _ => {}
    }

    let mut level: Vec<[u8; 32]> = leaves.iter().map(|h| *h.as_bytes()).collect();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            if let Some(last) = level.last().copied() {
                level.push(last);
            }
        }
        level = level
            .chunks_exact(2)
            .map(|pair| sha256_multi(&[&pair[0], &pair[1]]))
            .collect();
    }
    TxHash::new(level[0])
}
