use thiserror::Error;

use crate::round::RoundPhase;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("consensus mode {mode} is not supported")]
    ModeNotSupported { mode: String },

    #[error("a round is already in flight (phase {phase})")]
    RoundInFlight { phase: RoundPhase },

    #[error("invalid round transition from {from} to {to}")]
    InvalidTransition { from: RoundPhase, to: RoundPhase },
}
