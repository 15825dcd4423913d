//! TCP peer connections: inbound listener, outbound dialer and the per-peer
//! read and write tasks.
//!
//! Each connection registers with the [`PeerBroadcaster`](sdupi_network::PeerBroadcaster)
//! under its remote `ip:port`. The write task drains that peer's outbound
//! queue; the read task feeds frames to [`on_peer_message`] and unregisters
//! the peer when the stream ends.

use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use sdupi_messages::PeerMessage;
use sdupi_network::{read_frame, write_frame};

use crate::context::NodeContext;
use crate::peer_dispatch::on_peer_message;
use crate::shutdown::ShutdownController;
use crate::NodeError;

/// Timeout for the initial TCP connection attempt.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Register `stream` as peer `peer_id` and spawn its read and write tasks.
pub async fn attach_peer(
    stream: TcpStream,
    peer_id: String,
    ctx: &NodeContext,
    shutdown: &ShutdownController,
) -> Result<(), NodeError> {
    let mut outbound = ctx.peers.connect(&peer_id).await?;
    ctx.metrics.peer_count.set(ctx.peers.peer_count().await as i64);
    tracing::info!(peer = %peer_id, "peer attached");

    let (mut reader, mut writer) = stream.into_split();

    let mut write_shutdown = shutdown.subscribe();
    let write_peer = peer_id.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = write_shutdown.recv() => break,
                next = outbound.recv() => {
                    let Some(bytes) = next else { break };
                    if let Err(e) = write_frame(&mut writer, &bytes).await {
                        tracing::warn!(peer = %write_peer, error = %e, "peer write failed");
                        break;
                    }
                    tracing::trace!(peer = %write_peer, bytes = bytes.len(), "frame sent");
                }
            }
        }
    });

    let mut read_shutdown = shutdown.subscribe();
    let ctx = ctx.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = read_shutdown.recv() => break,
                frame = read_frame(&mut reader, None) => match frame {
                    Ok(Some(bytes)) => {
                        tracing::trace!(peer = %peer_id, bytes = bytes.len(), "frame received");
                        on_peer_message(&ctx, &peer_id, &bytes).await;
                    }
                    Ok(None) => {
                        tracing::info!(peer = %peer_id, "peer closed connection");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(peer = %peer_id, error = %e, "peer read failed");
                        break;
                    }
                },
            }
        }
        ctx.peers.disconnect(&peer_id).await;
        ctx.metrics.peer_count.set(ctx.peers.peer_count().await as i64);
    });

    Ok(())
}

/// Accept inbound peers until shutdown.
pub fn spawn_listener(
    listener: TcpListener,
    ctx: NodeContext,
    shutdown: ShutdownController,
) -> JoinHandle<()> {
    let mut stop: broadcast::Receiver<()> = shutdown.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop.recv() => {
                    tracing::info!("peer listener stopping");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let peer_id = addr.to_string();
                        if let Err(e) = attach_peer(stream, peer_id.clone(), &ctx, &shutdown).await {
                            tracing::warn!(peer = %peer_id, error = %e, "refused inbound peer");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                },
            }
        }
    })
}

/// Dial `addr` ("ip:port"), attach it and ask for its chain.
///
/// Returns the peer id the connection was registered under.
pub async fn connect_to_peer(
    addr: &str,
    ctx: &NodeContext,
    shutdown: &ShutdownController,
) -> Result<String, NodeError> {
    let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
        .await
        .map_err(|_| NodeError::Network(sdupi_network::NetworkError::Timeout("connecting to peer")))??;
    let peer_id = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| addr.to_string());

    attach_peer(stream, peer_id.clone(), ctx, shutdown).await?;
    ctx.peers.send_to(&peer_id, PeerMessage::SyncRequest).await?;
    tracing::info!(peer = %peer_id, "connected to peer, chain requested");
    Ok(peer_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sdupi_nullables::NullClock;
    use sdupi_types::NetworkId;

    fn context() -> NodeContext {
        NodeContext::new(NetworkId::Dev, 100, 8, 8, Arc::new(NullClock::new(0)))
    }

    async fn wait_for_peers(ctx: &NodeContext, count: usize) -> bool {
        for _ in 0..100 {
            if ctx.peers.peer_count().await == count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn dial_registers_on_both_sides_and_disconnects_on_shutdown() {
        let server = context();
        let server_shutdown = ShutdownController::new();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = spawn_listener(listener, server.clone(), server_shutdown.clone());

        let client = context();
        let client_shutdown = ShutdownController::new();
        let peer_id = connect_to_peer(&addr, &client, &client_shutdown)
            .await
            .unwrap();
        assert_eq!(peer_id, addr);
        assert!(wait_for_peers(&server, 1).await);
        assert_eq!(client.peers.peer_count().await, 1);

        server_shutdown.shutdown();
        handle.await.unwrap();
        // The server's read task ends, the socket closes, and the client
        // notices the peer is gone.
        assert!(wait_for_peers(&client, 0).await);
        client_shutdown.shutdown();
    }

    #[tokio::test]
    async fn dialing_nothing_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let ctx = context();
        let result = connect_to_peer(&addr, &ctx, &ShutdownController::new()).await;
        assert!(result.is_err());
        assert_eq!(ctx.peers.peer_count().await, 0);
    }
}
