//! SHA-256 hashing for blocks and transactions.

use sdupi_types::{BlockHash, TxHash};
use sha2::{Digest, Sha256};

/// Compute a SHA-256 hash of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn sha256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Block hash: `SHA-256(index BE ‖ previous_hash ‖ nonce BE ‖ merkle_root)`.
///
/// This is the inner loop of the nonce search, so it hashes the fields in
/// place instead of building an intermediate buffer.
pub fn hash_block_header(
    index: u64,
    previous_hash: &BlockHash,
    nonce: u64,
    merkle_root: &TxHash,
) -> BlockHash {
    let mut hasher = Sha256::new();
    hasher.update(index.to_be_bytes());
    hasher.update(previous_hash.as_bytes());
    hasher.update(nonce.to_be_bytes());
    hasher.update(merkle_root.as_bytes());
    BlockHash::new(hasher.finalize().into())
}

/// Canonical bytes a producer signs: `index BE ‖ previous_hash ‖ merkle_root ‖ timestamp_ms BE`.
pub fn block_signing_bytes(
    index: u64,
    previous_hash: &BlockHash,
    merkle_root: &TxHash,
    timestamp_ms: u64,
) -> [u8; 80] {
    let mut out = [0u8; 80];
    out[..8].copy_from_slice(&index.to_be_bytes());
    out[8..40].copy_from_slice(previous_hash.as_bytes());
    out[40..72].copy_from_slice(merkle_root.as_bytes());
    out[72..].copy_from_slice(&timestamp_ms.to_be_bytes());
    out
}
