//! Consensus mode.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ConsensusError;

/// How blocks are agreed on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsensusMode {
    /// This node alone produces and appends blocks.
    #[default]
    SingleProducer,
    /// A block needs `threshold` peer confirmations. Not implemented.
    QuorumBased { threshold: u32 },
}

impl ConsensusMode {
    /// Fail unless this mode can actually run.
    pub fn ensure_supported(&self) -> Result<(), ConsensusError> {
        match self {
            Self::SingleProducer => Ok(()),
            Self::QuorumBased { .. } => Err(ConsensusError::ModeNotSupported {
                mode: self.to_string(),
            }),
        }
    }
}

impl fmt::Display for ConsensusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleProducer => f.write_str("single_producer"),
            Self::QuorumBased { threshold } => write!(f, "quorum_based(threshold={threshold})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_producer_is_supported() {
        assert!(ConsensusMode::SingleProducer.ensure_supported().is_ok());
    }

    #[test]
    fn quorum_is_rejected() {
        let err = ConsensusMode::QuorumBased { threshold: 3 }
            .ensure_supported()
            .unwrap_err();
        assert!(matches!(err, ConsensusError::ModeNotSupported { .. }));
        assert!(err.to_string().contains("threshold=3"));
    }

    #[test]
    fn deserializes_tagged_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            consensus_mode: ConsensusMode,
        }
        let w: Wrapper = toml::from_str(
            r#"
            [consensus_mode]
            type = "quorum_based"
            threshold = 2
            "#,
        )
        .unwrap();
        assert_eq!(w.consensus_mode, ConsensusMode::QuorumBased { threshold: 2 });
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_string(&ConsensusMode::SingleProducer).unwrap();
        assert_eq!(json, r#"{"type":"single_producer"}"#);
    }
}
