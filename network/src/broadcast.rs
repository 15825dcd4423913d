//! Peer set and best-effort broadcasting.
//!
//! The [`PeerBroadcaster`] does not write to TCP streams. Each connected
//! peer has a bounded `mpsc` queue of encoded envelopes that the connection
//! layer drains. Broadcasting encodes once and `try_send`s onto every queue;
//! a full or closed queue drops the message for that peer only.

use std::collections::HashMap;

use sdupi_ledger::Block;
use sdupi_messages::{encode_envelope, Envelope, PeerMessage};
use sdupi_transactions::Transaction;
use sdupi_types::{NetworkId, Timestamp};
use tokio::sync::{mpsc, RwLock};

use crate::NetworkError;

/// The receiving end of a peer's outbound queue.
pub type PeerChannel = mpsc::Receiver<Vec<u8>>;

/// Outcome of a broadcast attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastResult {
    /// Number of peers the message was queued for.
    pub sent: usize,
    /// Number of peers whose queue was full or closed.
    pub failed: usize,
}

/// Connected peers keyed by `ip:port`, each with an outbound queue.
pub struct PeerBroadcaster {
    network: NetworkId,
    queue_capacity: usize,
    max_peers: usize,
    peers: RwLock<HashMap<String, mpsc::Sender<Vec<u8>>>>,
}

impl PeerBroadcaster {
    pub fn new(network: NetworkId, queue_capacity: usize, max_peers: usize) -> Self {
        Self {
            network,
            queue_capacity: queue_capacity.max(1),
            max_peers,
            peers: RwLock::new(HashMap::new()),
        }
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }

    /// Register a peer and return its outbound queue.
    ///
    /// Reconnecting an existing peer id replaces its queue; the old receiver
    /// sees the channel close.
    pub async fn connect(&self, peer_id: &str) -> Result<PeerChannel, NetworkError> {
        let mut peers = self.peers.write().await;
        if !peers.contains_key(peer_id) && peers.len() >= self.max_peers {
            return Err(NetworkError::TooManyPeers {
                max: self.max_peers,
            });
        }
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        peers.insert(peer_id.to_string(), tx);
        tracing::debug!(peer = %peer_id, peers = peers.len(), "peer connected");
        Ok(rx)
    }

    /// Remove a peer. Returns whether it was connected.
    pub async fn disconnect(&self, peer_id: &str) -> bool {
        let removed = self.peers.write().await.remove(peer_id).is_some();
        if removed {
            tracing::debug!(peer = %peer_id, "peer disconnected");
        }
        removed
    }

    pub async fn peer_count(&self) -> usize {
        self.peers.read().await.len()
    }

    pub async fn peer_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.peers.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Wrap `message` in an envelope for this node's network and encode it.
    pub fn encode(&self, message: PeerMessage) -> Result<Vec<u8>, NetworkError> {
        let envelope = Envelope::new(self.network, message, Timestamp::now());
        Ok(encode_envelope(&envelope)?)
    }

    pub async fn announce_block(&self, block: &Block) -> Result<BroadcastResult, NetworkError> {
        let bytes = self.encode(PeerMessage::NewBlock {
            block: block.clone(),
        })?;
        Ok(self.broadcast_bytes(&bytes, None).await)
    }

    pub async fn announce_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<BroadcastResult, NetworkError> {
        let bytes = self.encode(PeerMessage::NewTransaction {
            transaction: transaction.clone(),
        })?;
        Ok(self.broadcast_bytes(&bytes, None).await)
    }

    /// Forward an accepted peer message to every peer except its origin.
    pub async fn relay(
        &self,
        message: PeerMessage,
        origin: &str,
    ) -> Result<BroadcastResult, NetworkError> {
        let bytes = self.encode(message)?;
        Ok(self.broadcast_bytes(&bytes, Some(origin)).await)
    }

    /// Queue a message for one peer.
    pub async fn send_to(&self, peer_id: &str, message: PeerMessage) -> Result<(), NetworkError> {
        let bytes = self.encode(message)?;
        let peers = self.peers.read().await;
        let sender = peers
            .get(peer_id)
            .ok_or_else(|| NetworkError::PeerNotFound(peer_id.to_string()))?;
        sender
            .try_send(bytes)
            .map_err(|_| NetworkError::QueueFull(peer_id.to_string()))
    }

    /// Queue already-encoded bytes for every peer except `except`.
    pub async fn broadcast_bytes(&self, bytes: &[u8], except: Option<&str>) -> BroadcastResult {
        let mut result = BroadcastResult::default();
        let peers = self.peers.read().await;
        for (peer_id, sender) in peers.iter() {
            if except == Some(peer_id.as_str()) {
                continue;
            }
            match sender.try_send(bytes.to_vec()) {
                Ok(()) => result.sent += 1,
                Err(e) => {
                    tracing::debug!(peer = %peer_id, error = %e, "dropped outbound message");
                    result.failed += 1;
                }
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
