//! P2P networking layer for the SDUPI ledger node.
//!
//! The [`PeerBroadcaster`] owns the set of connected peers and a bounded
//! outbound queue per peer. It never writes to sockets itself: the node's
//! connection tasks drain each queue and write frames with
//! [`connection::write_frame`].

pub mod broadcast;
pub mod connection;
pub mod error;

pub use broadcast::{BroadcastResult, PeerBroadcaster, PeerChannel};
pub use connection::{read_frame, write_frame};
pub use error::NetworkError;
