//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies the node touches (currently the wall clock) sit
//! behind traits. The implementations here:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Are safe to share across threads and tasks
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;

pub use clock::NullClock;
