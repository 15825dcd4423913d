use sdupi_messages::MessageError;
use sdupi_types::SdupiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("peer {0} not found")]
    PeerNotFound(String),

    #[error("peer limit reached ({max})")]
    TooManyPeers { max: usize },

    #[error("outbound queue for peer {0} is full")]
    QueueFull(String),

    #[error("frame of {size} bytes exceeds limit of {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("timed out: {0}")]
    Timeout(&'static str),

    #[error("message error: {0}")]
    Message(#[from] MessageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<NetworkError> for SdupiError {
    fn from(e: NetworkError) -> Self {
        match e {
            NetworkError::TooManyPeers { max } => SdupiError::CapacityExceeded { limit: max },
            NetworkError::Message(m) => m.into(),
            other => SdupiError::PeerProtocol(other.to_string()),
        }
    }
}
