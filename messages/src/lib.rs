//! Peer protocol messages for SDUPI node-to-node communication.
//!
//! Every frame on the wire is one bincode-encoded [`Envelope`]: a header that
//! names the network and protocol version, and one [`PeerMessage`].

pub mod codec;
pub mod error;

pub use codec::{decode_envelope, encode_envelope, full_chain_chunks, MAX_MESSAGE_SIZE};
pub use error::MessageError;

use sdupi_ledger::Block;
use sdupi_transactions::Transaction;
use sdupi_types::{NetworkId, Timestamp};
use serde::{Deserialize, Serialize};

/// Current protocol version. Peers on another version are ignored.
pub const PROTOCOL_VERSION: u16 = 1;

/// Header present on every peer message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    pub network_id: NetworkId,
    pub protocol_version: u16,
    pub timestamp: Timestamp,
}

/// All messages in the protocol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerMessage {
    /// A block the sender appended.
    NewBlock { block: Block },
    /// A transaction the sender accepted into its pool.
    NewTransaction { transaction: Transaction },
    /// Ask for the receiver's full chain.
    SyncRequest,
    /// Reply to `SyncRequest`: the full chain, genesis first.
    FullChain { blocks: Vec<Block> },
}

impl PeerMessage {
    /// Short name for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewBlock { .. } => "new_block",
            Self::NewTransaction { .. } => "new_transaction",
            Self::SyncRequest => "sync_request",
            Self::FullChain { .. } => "full_chain",
        }
    }
}

/// A header plus one message: the unit encoded into a frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub header: MessageHeader,
    pub message: PeerMessage,
}

impl Envelope {
    pub fn new(network_id: NetworkId, message: PeerMessage, timestamp: Timestamp) -> Self {
        Self {
            header: MessageHeader {
                network_id,
                protocol_version: PROTOCOL_VERSION,
                timestamp,
            },
            message,
        }
    }

    /// Reject envelopes for another network or protocol version.
    pub fn check(&self, network: NetworkId) -> Result<(), MessageError> {
        if self.header.network_id != network {
            return Err(MessageError::WrongNetwork {
                expected: network,
                actual: self.header.network_id,
            });
        }
        if self.header.protocol_version != PROTOCOL_VERSION {
            return Err(MessageError::UnsupportedVersion {
                version: self.header.protocol_version,
            });
        }
        Ok(())
    }
}
