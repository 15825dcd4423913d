//! Round state machine.
//!
//! A round moves `Idle → Collecting → Building → Appending → Idle`. An empty
//! batch ends it at `Collecting`. Rounds never overlap: a tick that arrives
//! while a round is in flight is counted as skipped.

use std::fmt;

use sdupi_types::BlockHash;
use serde::{Deserialize, Serialize};

use crate::ConsensusError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundPhase {
    #[default]
    Idle,
    Collecting,
    Building,
    Appending,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Collecting => "collecting",
            Self::Building => "building",
            Self::Appending => "appending",
        })
    }
}

/// What a round ended with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The pool was empty; no block.
    Empty,
    /// A block was appended.
    Produced {
        index: u64,
        hash: BlockHash,
        transactions: usize,
        /// `false` when the nonce search hit its cap.
        met_target: bool,
        iterations: u64,
    },
    /// The ledger refused the candidate.
    Rejected {
        index: u64,
        reason: String,
        requeued: usize,
    },
    /// Another round was in flight.
    Skipped,
}

impl RoundOutcome {
    pub fn produced_block(&self) -> bool {
        matches!(self, Self::Produced { .. })
    }
}

/// Running totals over all rounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStats {
    pub started: u64,
    pub produced: u64,
    pub empty: u64,
    pub rejected: u64,
    pub skipped: u64,
    pub target_misses: u64,
}

/// Current phase plus totals.
#[derive(Clone, Debug, Default)]
pub struct RoundState {
    phase: RoundPhase,
    round: u64,
    stats: RoundStats,
}

impl RoundState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Number of the current (or last) round; 0 before the first.
    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn stats(&self) -> RoundStats {
        self.stats
    }

    pub fn in_flight(&self) -> bool {
        self.phase != RoundPhase::Idle
    }

    /// Start a round. Counts a skip and fails if one is already running.
    pub fn begin(&mut self) -> Result<u64, ConsensusError> {
        if self.in_flight() {
            self.stats.skipped += 1;
            return Err(ConsensusError::RoundInFlight { phase: self.phase });
        }
        self.round += 1;
        self.stats.started += 1;
        self.phase = RoundPhase::Collecting;
        Ok(self.round)
    }

    pub fn start_building(&mut self) -> Result<(), ConsensusError> {
        self.transition(RoundPhase::Collecting, RoundPhase::Building)
    }

    pub fn start_appending(&mut self) -> Result<(), ConsensusError> {
        self.transition(RoundPhase::Building, RoundPhase::Appending)
    }

    /// Return to `Idle`, recording how the round ended.
    pub fn finish(&mut self, outcome: &RoundOutcome) {
        match outcome {
            RoundOutcome::Empty => self.stats.empty += 1,
            RoundOutcome::Produced { met_target, .. } => {
                self.stats.produced += 1;
                if !met_target {
                    self.stats.target_misses += 1;
                }
            }
            RoundOutcome::Rejected { .. } => self.stats.rejected += 1,
            RoundOutcome::Skipped => self.stats.skipped += 1,
        }
        self.phase = RoundPhase::Idle;
    }

    fn transition(&mut self, from: RoundPhase, to: RoundPhase) -> Result<(), ConsensusError> {
        if self.phase != from {
            return Err(ConsensusError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn produced(met_target: bool) -> RoundOutcome {
        RoundOutcome::Produced {
            index: 1,
            hash: BlockHash::ZERO,
            transactions: 3,
            met_target,
            iterations: 10,
        }
    }

    #[test]
    fn full_round_walks_every_phase() {
        let mut state = RoundState::new();
        assert_eq!(state.begin(), Ok(1));
        assert_eq!(state.phase(), RoundPhase::Collecting);
        state.start_building().unwrap();
        assert_eq!(state.phase(), RoundPhase::Building);
        state.start_appending().unwrap();
        assert_eq!(state.phase(), RoundPhase::Appending);
        state.finish(&produced(true));
        assert_eq!(state.phase(), RoundPhase::Idle);
        assert_eq!(state.stats().produced, 1);
        assert_eq!(state.stats().target_misses, 0);
    }

    #[test]
    fn empty_round_returns_to_idle_from_collecting() {
        let mut state = RoundState::new();
        state.begin().unwrap();
        state.finish(&RoundOutcome::Empty);
        assert!(!state.in_flight());
        assert_eq!(state.stats().empty, 1);
    }

    #[test]
    fn overlapping_begin_is_skipped() {
        let mut state = RoundState::new();
        state.begin().unwrap();
        state.start_building().unwrap();
        assert_eq!(
            state.begin(),
            Err(ConsensusError::RoundInFlight {
                phase: RoundPhase::Building
            })
        );
        assert_eq!(state.stats().skipped, 1);
        assert_eq!(state.round(), 1);
    }

    #[test]
    fn out_of_order_transition_rejected() {
        let mut state = RoundState::new();
        assert_eq!(
            state.start_appending(),
            Err(ConsensusError::InvalidTransition {
                from: RoundPhase::Idle,
                to: RoundPhase::Appending
            })
        );
    }

    #[test]
    fn missed_target_is_counted() {
        let mut state = RoundState::new();
        state.begin().unwrap();
        state.start_building().unwrap();
        state.start_appending().unwrap();
        state.finish(&produced(false));
        assert_eq!(state.stats().target_misses, 1);
    }

    #[test]
    fn rounds_are_numbered() {
        let mut state = RoundState::new();
        for expected in 1..=3 {
            assert_eq!(state.begin(), Ok(expected));
            state.finish(&RoundOutcome::Empty);
        }
        assert_eq!(state.stats().started, 3);
    }
}
