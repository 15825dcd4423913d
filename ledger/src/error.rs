use sdupi_types::SdupiError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid index: expected {expected}, got {actual}")]
    InvalidIndex { expected: u64, actual: u64 },

    #[error("invalid previous hash at index {index}: expected {expected}, got {actual}")]
    InvalidPreviousHash {
        index: u64,
        expected: String,
        actual: String,
    },

    #[error("merkle root of block {index} does not match its transactions")]
    InvalidMerkleRoot { index: u64 },

    #[error("hash of block {index} does not match its header")]
    InvalidHash { index: u64 },

    #[error("signature of block {index} does not verify for producer {producer}")]
    InvalidSignature { index: u64, producer: String },

    #[error("block {index} contains invalid transaction {hash}: {reason}")]
    InvalidTransaction {
        index: u64,
        hash: String,
        reason: String,
    },

    #[error("block {index} contains transaction {hash} that is already on chain")]
    DuplicateTransaction { index: u64, hash: String },
}

impl From<LedgerError> for SdupiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DuplicateTransaction { .. } => SdupiError::DuplicateTransaction,
            other => SdupiError::Validation(other.to_string()),
        }
    }
}
