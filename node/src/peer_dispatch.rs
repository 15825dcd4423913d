//! Handling of decoded peer messages.
//!
//! Every failure here is logged and dropped. The connection that delivered
//! the message stays open.

use sdupi_ledger::{Block, LedgerError};
use sdupi_messages::{decode_envelope, full_chain_chunks, PeerMessage};
use sdupi_transactions::Transaction;
use sdupi_types::TxHash;

use crate::context::NodeContext;

/// What a peer message led to.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    BlockAccepted { index: u64 },
    BlockRejected(LedgerError),
    TransactionAccepted(TxHash),
    TransactionRejected(String),
    ChainSent { blocks: usize },
    ChainExtended { appended: usize },
    /// Undecodable, wrong network or unsupported version.
    Dropped(String),
}

/// Decode one frame from `peer` and act on it.
pub async fn on_peer_message(ctx: &NodeContext, peer: &str, bytes: &[u8]) -> DispatchOutcome {
    let envelope = match decode_envelope(bytes) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(peer, error = %e, "dropping undecodable peer message");
            return DispatchOutcome::Dropped(e.to_string());
        }
    };
    if let Err(e) = envelope.check(ctx.network) {
        tracing::warn!(peer, error = %e, "dropping peer message");
        return DispatchOutcome::Dropped(e.to_string());
    }

    tracing::trace!(peer, kind = envelope.message.kind(), "peer message");
    match envelope.message {
        PeerMessage::NewBlock { block } => on_new_block(ctx, peer, block).await,
        PeerMessage::NewTransaction { transaction } => {
            on_new_transaction(ctx, peer, transaction).await
        }
        PeerMessage::SyncRequest => on_sync_request(ctx, peer).await,
        PeerMessage::FullChain { blocks } => on_full_chain(ctx, peer, &blocks).await,
    }
}

async fn on_new_block(ctx: &NodeContext, peer: &str, block: Block) -> DispatchOutcome {
    let index = block.index;
    let hashes: Vec<TxHash> = block.transactions.iter().map(|tx| tx.hash).collect();

    let appended = ctx.ledger.write().await.append(block.clone());
    if let Err(e) = appended {
        ctx.metrics.blocks_rejected.inc();
        tracing::warn!(peer, index, error = %e, "rejected block from peer");
        return DispatchOutcome::BlockRejected(e);
    }

    ctx.metrics.peer_blocks_accepted.inc();
    ctx.pool.lock().await.remove_confirmed(&hashes);
    ctx.tracker.lock().await.record(hashes.len());
    tracing::info!(peer, index, hash = %block.hash, "accepted block from peer");

    match ctx.peers.relay(PeerMessage::NewBlock { block }, peer).await {
        Ok(result) => tracing::debug!(index, sent = result.sent, "relayed block"),
        Err(e) => tracing::warn!(index, error = %e, "failed to relay block"),
    }
    DispatchOutcome::BlockAccepted { index }
}

async fn on_new_transaction(
    ctx: &NodeContext,
    peer: &str,
    transaction: Transaction,
) -> DispatchOutcome {
    match ctx.admit_transaction(transaction.clone()).await {
        Ok(hash) => {
            match ctx
                .peers
                .relay(PeerMessage::NewTransaction { transaction }, peer)
                .await
            {
                Ok(result) => tracing::debug!(hash = %hash, sent = result.sent, "relayed transaction"),
                Err(e) => tracing::warn!(hash = %hash, error = %e, "failed to relay transaction"),
            }
            DispatchOutcome::TransactionAccepted(hash)
        }
        Err(e) => {
            // Duplicates are the normal end of a relay, not worth a warning.
            tracing::debug!(peer, error = %e, "transaction from peer not admitted");
            DispatchOutcome::TransactionRejected(e.to_string())
        }
    }
}

async fn on_sync_request(ctx: &NodeContext, peer: &str) -> DispatchOutcome {
    let blocks = ctx.ledger.read().await.blocks().to_vec();
    let count = blocks.len();
    let chunks = match full_chain_chunks(&blocks) {
        Ok(chunks) => chunks,
        Err(e) => {
            tracing::warn!(peer, blocks = count, error = %e, "chain cannot be framed for sync");
            return DispatchOutcome::Dropped(e.to_string());
        }
    };

    let frames = chunks.len();
    for (frame, chunk) in chunks.into_iter().enumerate() {
        let message = PeerMessage::FullChain {
            blocks: chunk.to_vec(),
        };
        if let Err(e) = ctx.peers.send_to(peer, message).await {
            tracing::warn!(peer, blocks = count, frame, frames, error = %e, "failed to send full chain");
            return DispatchOutcome::Dropped(e.to_string());
        }
    }
    tracing::debug!(peer, blocks = count, frames, "sent full chain");
    DispatchOutcome::ChainSent { blocks: count }
}

async fn on_full_chain(ctx: &NodeContext, peer: &str, blocks: &[Block]) -> DispatchOutcome {
    let (from, extension) = {
        let mut ledger = ctx.ledger.write().await;
        let from = ledger.height();
        (from, ledger.extend_from(blocks))
    };

    if extension.appended > 0 {
        let to = from + extension.appended as u64;
        let confirmed: Vec<TxHash> = blocks
            .iter()
            .filter(|b| b.index > from && b.index <= to)
            .flat_map(|b| b.transactions.iter().map(|tx| tx.hash))
            .collect();
        ctx.metrics
            .peer_blocks_accepted
            .inc_by(extension.appended as u64);
        ctx.pool.lock().await.remove_confirmed(&confirmed);
        tracing::info!(peer, appended = extension.appended, "extended chain from peer");
    }
    if let Some((index, e)) = &extension.stopped_at {
        ctx.metrics.blocks_rejected.inc();
        tracing::warn!(peer, index, error = %e, "peer chain rejected");
    }
    DispatchOutcome::ChainExtended {
        appended: extension.appended,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sdupi_crypto::ProducerIdentity;
    use sdupi_ledger::{BlockBuilder, ChainTip};
    use sdupi_messages::{encode_envelope, Envelope};
    use sdupi_nullables::NullClock;
    use sdupi_transactions::TxKind;
    use sdupi_types::{BlockHash, NetworkId, Timestamp};
    use sdupi_work::DifficultyPrefix;

    fn context() -> NodeContext {
        NodeContext::new(NetworkId::Dev, 100, 8, 8, Arc::new(NullClock::new(1_000)))
    }

    fn frame(network: NetworkId, message: PeerMessage) -> Vec<u8> {
        encode_envelope(&Envelope::new(network, message, Timestamp::from_millis(1))).unwrap()
    }

    fn tx(n: u64) -> Transaction {
        Transaction::new("alice", "bob", n, TxKind::Transfer, Timestamp::from_millis(n))
    }

    fn block_on(tip: ChainTip, txs: Vec<Transaction>) -> Block {
        BlockBuilder::new(Arc::new(NullClock::new(5_000)))
            .build(
                tip,
                txs,
                &ProducerIdentity::keyed("peer-node").unwrap(),
                &DifficultyPrefix::default(),
                1,
            )
            .block
    }

    #[tokio::test]
    async fn garbage_is_dropped() {
        let ctx = context();
        let outcome = on_peer_message(&ctx, "1.2.3.4:1", &[0xff, 0x00, 0x13]).await;
        assert!(matches!(outcome, DispatchOutcome::Dropped(_)));
    }

    #[tokio::test]
    async fn other_network_is_dropped() {
        let ctx = context();
        let bytes = frame(NetworkId::Live, PeerMessage::SyncRequest);
        let outcome = on_peer_message(&ctx, "1.2.3.4:1", &bytes).await;
        assert!(matches!(outcome, DispatchOutcome::Dropped(_)));
    }

    #[tokio::test]
    async fn new_block_on_tip_is_accepted_and_clears_pool() {
        let ctx = context();
        ctx.admit_transaction(tx(1)).await.unwrap();
        ctx.admit_transaction(tx(2)).await.unwrap();

        let tip = ctx.ledger.read().await.chain_tip();
        let block = block_on(tip, vec![tx(1)]);
        let bytes = frame(NetworkId::Dev, PeerMessage::NewBlock { block });
        let outcome = on_peer_message(&ctx, "1.2.3.4:1", &bytes).await;

        assert_eq!(outcome, DispatchOutcome::BlockAccepted { index: 1 });
        assert_eq!(ctx.ledger.read().await.height(), 1);
        let pool = ctx.pool.lock().await;
        assert_eq!(pool.size(), 1);
        assert!(pool.contains(&tx(2).hash));
    }

    #[tokio::test]
    async fn block_with_wrong_previous_hash_is_rejected() {
        let ctx = context();
        let fork = ChainTip {
            index: 0,
            hash: BlockHash::new([7; 32]),
        };
        let block = block_on(fork, vec![tx(1)]);
        let bytes = frame(NetworkId::Dev, PeerMessage::NewBlock { block });
        let outcome = on_peer_message(&ctx, "1.2.3.4:1", &bytes).await;

        assert!(matches!(
            outcome,
            DispatchOutcome::BlockRejected(LedgerError::InvalidPreviousHash { .. })
        ));
        assert_eq!(ctx.ledger.read().await.height(), 0);
        assert_eq!(ctx.metrics.blocks_rejected.get(), 1);
    }

    #[tokio::test]
    async fn new_transaction_is_admitted_and_relayed() {
        let ctx = context();
        let mut origin = ctx.peers.connect("origin:1").await.unwrap();
        let mut other = ctx.peers.connect("other:2").await.unwrap();

        let t = tx(3);
        let bytes = frame(
            NetworkId::Dev,
            PeerMessage::NewTransaction {
                transaction: t.clone(),
            },
        );
        let outcome = on_peer_message(&ctx, "origin:1", &bytes).await;
        assert_eq!(outcome, DispatchOutcome::TransactionAccepted(t.hash));
        assert!(other.try_recv().is_ok());
        assert!(origin.try_recv().is_err());

        // The echo from another peer ends the relay.
        let again = on_peer_message(&ctx, "other:2", &bytes).await;
        assert!(matches!(again, DispatchOutcome::TransactionRejected(_)));
    }

    #[tokio::test]
    async fn sync_request_answers_with_full_chain() {
        let ctx = context();
        let mut channel = ctx.peers.connect("asker:9").await.unwrap();
        let bytes = frame(NetworkId::Dev, PeerMessage::SyncRequest);

        let outcome = on_peer_message(&ctx, "asker:9", &bytes).await;
        assert_eq!(outcome, DispatchOutcome::ChainSent { blocks: 1 });

        let reply = decode_envelope(&channel.try_recv().unwrap()).unwrap();
        match reply.message {
            PeerMessage::FullChain { blocks } => assert_eq!(blocks.len(), 1),
            other => panic!("unexpected reply {}", other.kind()),
        }
    }

    #[tokio::test]
    async fn full_chain_extends_local_ledger() {
        let source = context();
        let tip = source.ledger.read().await.chain_tip();
        let b1 = block_on(tip, vec![tx(1)]);
        source.ledger.write().await.append(b1.clone()).unwrap();
        let b2 = block_on(b1.as_tip(), vec![tx(2)]);
        source.ledger.write().await.append(b2).unwrap();
        let blocks = source.ledger.read().await.blocks().to_vec();

        let ctx = context();
        ctx.admit_transaction(tx(2)).await.unwrap();
        let bytes = frame(NetworkId::Dev, PeerMessage::FullChain { blocks });
        let outcome = on_peer_message(&ctx, "seed:1", &bytes).await;

        assert_eq!(outcome, DispatchOutcome::ChainExtended { appended: 2 });
        assert_eq!(ctx.ledger.read().await.height(), 2);
        assert!(ctx.pool.lock().await.is_empty());
    }
}
