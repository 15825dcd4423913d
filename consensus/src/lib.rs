//! Consensus for the SDUPI ledger node.
//!
//! There is no agreement protocol: a single producer closes a round on a
//! fixed interval and appends the block it built. This crate holds the pieces
//! of that scheme that are independent of the async runtime.
//!
//! ## Module overview
//!
//! - [`mode`]: which consensus mode is configured and whether it can run.
//! - [`round`]: the `Idle → Collecting → Building → Appending → Idle` state
//!   machine and the outcome of a round.
//! - [`error`]: consensus error types.

pub mod error;
pub mod mode;
pub mod round;

pub use error::ConsensusError;
pub use mode::ConsensusMode;
pub use round::{RoundOutcome, RoundPhase, RoundState, RoundStats};
