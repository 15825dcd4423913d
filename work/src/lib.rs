//! Bounded hash puzzle for block production.
//!
//! Not a security mechanism: the producer searches for a nonce whose block
//! hash, in hex, starts with a configured prefix, and gives up after a fixed
//! number of attempts. A block that missed the target is still produced.

pub mod difficulty;
pub mod error;
pub mod generator;
pub mod validator;

pub use difficulty::DifficultyPrefix;
pub use error::WorkError;
pub use generator::{WorkGenerator, WorkOutcome, DEFAULT_BATCH_SIZE};
pub use validator::{meets_prefix, validate_work};
