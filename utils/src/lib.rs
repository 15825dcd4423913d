//! Shared utilities for the SDUPI ledger node.

pub mod clock;
pub mod time;

pub use clock::{Clock, SystemClock};
pub use time::{format_duration, format_millis};
