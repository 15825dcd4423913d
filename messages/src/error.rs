use sdupi_types::{NetworkId, SdupiError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("failed to encode message: {0}")]
    Encode(String),

    #[error("failed to decode message: {0}")]
    Decode(String),

    #[error("message for network {actual}, this node is on {expected}")]
    WrongNetwork {
        expected: NetworkId,
        actual: NetworkId,
    },

    #[error("unsupported protocol version {version}")]
    UnsupportedVersion { version: u16 },
}

impl From<MessageError> for SdupiError {
    fn from(e: MessageError) -> Self {
        SdupiError::PeerProtocol(e.to_string())
    }
}
