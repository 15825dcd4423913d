//! Transactions accepted by the SDUPI ledger node.
//!
//! A transaction moves `amount` from `sender` to `receiver`. Its hash is
//! SHA-256 over a canonical length-prefixed encoding of the content fields,
//! so two transactions with the same content and timestamp share a hash and
//! the pool treats the second as a duplicate.

pub mod error;
pub mod validation;

pub use error::TransactionError;
pub use validation::validate_transaction;

use sdupi_crypto::sha256_multi;
use sdupi_types::{Timestamp, TxHash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a transaction is for. Carried and hashed, never interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    #[default]
    Transfer,
    Contract,
    Other,
}

impl TxKind {
    fn tag(self) -> u8 {
        match self {
            Self::Transfer => 0,
            Self::Contract => 1,
            Self::Other => 2,
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Transfer => "transfer",
            Self::Contract => "contract",
            Self::Other => "other",
        })
    }
}

/// An immutable value transfer request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: u64,
    pub kind: TxKind,
    pub timestamp: Timestamp,
    pub hash: TxHash,
    /// Opaque client signature, carried but never checked.
    pub signature: Option<String>,
}

impl Transaction {
    /// Create a transaction stamped with `timestamp` and its content hash.
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: u64,
        kind: TxKind,
        timestamp: Timestamp,
    ) -> Self {
        let sender = sender.into();
        let receiver = receiver.into();
        let hash = content_hash(&sender, &receiver, amount, kind, timestamp);
        Self {
            sender,
            receiver,
            amount,
            kind,
            timestamp,
            hash,
            signature: None,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Recompute the hash from the content fields.
    pub fn compute_hash(&self) -> TxHash {
        content_hash(
            &self.sender,
            &self.receiver,
            self.amount,
            self.kind,
            self.timestamp,
        )
    }

    /// Whether the stored hash matches the content.
    pub fn hash_matches(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

/// `SHA-256(len(sender) ‖ sender ‖ len(receiver) ‖ receiver ‖ amount ‖ kind ‖ timestamp)`,
/// lengths and integers big-endian. Length prefixes keep `("ab","c")` and
/// `("a","bc")` distinct.
fn content_hash(
    sender: &str,
    receiver: &str,
    amount: u64,
    kind: TxKind,
    timestamp: Timestamp,
) -> TxHash {
    let sender_len = (sender.len() as u32).to_be_bytes();
    let receiver_len = (receiver.len() as u32).to_be_bytes();
    TxHash::new(sha256_multi(&[
        &sender_len,
        sender.as_bytes(),
        &receiver_len,
        receiver.as_bytes(),
        &amount.to_be_bytes(),
        &[kind.tag()],
        &timestamp.as_millis().to_be_bytes(),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn new_sets_matching_hash() {
        let tx = Transaction::new("alice", "bob", 10, TxKind::Transfer, at(1_000));
        assert!(tx.hash_matches());
        assert!(!tx.hash.is_zero());
    }

    #[test]
    fn same_content_same_hash() {
        let a = Transaction::new("alice", "bob", 10, TxKind::Transfer, at(1_000));
        let b = Transaction::new("alice", "bob", 10, TxKind::Transfer, at(1_000));
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn each_field_changes_hash() {
        let base = Transaction::new("alice", "bob", 10, TxKind::Transfer, at(1_000));
        let variants = [
            Transaction::new("alicE", "bob", 10, TxKind::Transfer, at(1_000)),
            Transaction::new("alice", "bob2", 10, TxKind::Transfer, at(1_000)),
            Transaction::new("alice", "bob", 11, TxKind::Transfer, at(1_000)),
            Transaction::new("alice", "bob", 10, TxKind::Contract, at(1_000)),
            Transaction::new("alice", "bob", 10, TxKind::Transfer, at(1_001)),
        ];
        for v in variants {
            assert_ne!(v.hash, base.hash);
        }
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        let a = Transaction::new("ab", "c", 1, TxKind::Other, at(0));
        let b = Transaction::new("a", "bc", 1, TxKind::Other, at(0));
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn signature_is_not_hashed() {
        let tx = Transaction::new("alice", "bob", 10, TxKind::Transfer, at(5));
        let signed = tx.clone().with_signature("sig");
        assert_eq!(tx.hash, signed.hash);
        assert!(signed.hash_matches());
    }

    #[test]
    fn tampered_amount_detected() {
        let mut tx = Transaction::new("alice", "bob", 10, TxKind::Transfer, at(5));
        tx.amount = 1_000;
        assert!(!tx.hash_matches());
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&TxKind::Contract).unwrap();
        assert_eq!(json, "\"contract\"");
    }
}
