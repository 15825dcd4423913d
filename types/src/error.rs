//! Top-level error taxonomy shared across crates.
//!
//! Crate-local error enums map onto these categories so callers can react
//! without knowing which component failed.

use thiserror::Error;

/// Common error categories for the SDUPI node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdupiError {
    /// Malformed transaction or block.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("duplicate transaction hash")]
    DuplicateTransaction,

    /// The nonce search hit its iteration cap before meeting the target.
    /// Non-fatal: the best candidate is still produced.
    #[error("nonce search exhausted after {iterations} iterations")]
    ConsensusTimeout { iterations: u64 },

    /// Undecodable or unexpected peer message.
    #[error("peer protocol error: {0}")]
    PeerProtocol(String),

    #[error("capacity exceeded: limit {limit}")]
    CapacityExceeded { limit: usize },
}

impl SdupiError {
    /// Short machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::DuplicateTransaction => "duplicate_transaction",
            Self::ConsensusTimeout { .. } => "consensus_timeout",
            Self::PeerProtocol(_) => "peer_protocol",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(SdupiError::DuplicateTransaction.code(), "duplicate_transaction");
        assert_eq!(
            SdupiError::CapacityExceeded { limit: 3 }.code(),
            "capacity_exceeded"
        );
    }

    #[test]
    fn display_includes_detail() {
        let err = SdupiError::ConsensusTimeout { iterations: 42 };
        assert!(err.to_string().contains("42"));
    }
}
