//! Transaction validation logic.

use crate::error::TransactionError;
use crate::Transaction;

/// Validate a transaction's structure: non-empty parties, positive amount,
/// and a hash that matches the content.
///
/// This is stateless. Duplicate detection against the pool or the chain is
/// done by the node.
pub fn validate_transaction(tx: &Transaction) -> Result<(), TransactionError> {
    if tx.sender.trim().is_empty() {
        return Err(TransactionError::EmptySender);
    }
    if tx.receiver.trim().is_empty() {
        return Err(TransactionError::EmptyReceiver);
    }
    if tx.amount == 0 {
        return Err(TransactionError::ZeroAmount);
    }

    let expected = tx.compute_hash();
    if tx.hash != expected {
        return Err(TransactionError::HashMismatch {
            claimed: tx.hash.to_string(),
            expected: expected.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TxKind;
    use sdupi_types::{SdupiError, Timestamp, TxHash};

    fn tx(sender: &str, receiver: &str, amount: u64) -> Transaction {
        Transaction::new(sender, receiver, amount, TxKind::Transfer, Timestamp::from_millis(1))
    }

    #[test]
    fn valid_transaction_passes() {
        assert_eq!(validate_transaction(&tx("alice", "bob", 1)), Ok(()));
    }

    #[test]
    fn empty_sender_rejected() {
        assert_eq!(
            validate_transaction(&tx("", "bob", 1)),
            Err(TransactionError::EmptySender)
        );
    }

    #[test]
    fn whitespace_receiver_rejected() {
        assert_eq!(
            validate_transaction(&tx("alice", "  ", 1)),
            Err(TransactionError::EmptyReceiver)
        );
    }

    #[test]
    fn zero_amount_rejected() {
        assert_eq!(
            validate_transaction(&tx("alice", "bob", 0)),
            Err(TransactionError::ZeroAmount)
        );
    }

    #[test]
    fn forged_hash_rejected() {
        let mut t = tx("alice", "bob", 5);
        t.hash = TxHash::new([1u8; 32]);
        assert!(matches!(
            validate_transaction(&t),
            Err(TransactionError::HashMismatch { .. })
        ));
    }

    #[test]
    fn maps_to_validation_category() {
        let err: SdupiError = TransactionError::ZeroAmount.into();
        assert_eq!(err.code(), "validation");
    }
}
