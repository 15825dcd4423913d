use sdupi_types::SdupiError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("sender must not be empty")]
    EmptySender,

    #[error("receiver must not be empty")]
    EmptyReceiver,

    #[error("amount must be positive")]
    ZeroAmount,

    #[error("hash {claimed} does not match content (expected {expected})")]
    HashMismatch { claimed: String, expected: String },
}

impl From<TransactionError> for SdupiError {
    fn from(e: TransactionError) -> Self {
        SdupiError::Validation(e.to_string())
    }
}
