//! Wire encoding of envelopes.

use bincode::Options;
use sdupi_ledger::Block;

use crate::{Envelope, MessageError};

/// Largest encoded envelope accepted or produced (16 MiB).
pub const MAX_MESSAGE_SIZE: u64 = 16 * 1024 * 1024;

/// Room kept for the envelope header and the `FullChain` tags.
const FULL_CHAIN_OVERHEAD: u64 = 1024;

fn options() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_MESSAGE_SIZE)
}

pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, MessageError> {
    options()
        .serialize(envelope)
        .map_err(|e| MessageError::Encode(e.to_string()))
}

/// Decode one envelope. Trailing bytes are an error.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, MessageError> {
    options()
        .deserialize(bytes)
        .map_err(|e| MessageError::Decode(e.to_string()))
}

/// Split `blocks` into consecutive runs whose `FullChain` envelopes each
/// stay within [`MAX_MESSAGE_SIZE`]. Sent in order, they rebuild the chain.
pub fn full_chain_chunks(blocks: &[Block]) -> Result<Vec<&[Block]>, MessageError> {
    chunk_blocks(blocks, MAX_MESSAGE_SIZE - FULL_CHAIN_OVERHEAD)
}

fn chunk_blocks(blocks: &[Block], budget: u64) -> Result<Vec<&[Block]>, MessageError> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut used = 0u64;
    for (i, block) in blocks.iter().enumerate() {
        let size = options()
            .serialized_size(block)
            .map_err(|e| MessageError::Encode(e.to_string()))?;
        if size > budget {
            return Err(MessageError::Encode(format!(
                "block {} needs {size} bytes, frame budget is {budget}",
                block.index
            )));
        }
        if used + size > budget {
            chunks.push(&blocks[start..i]);
            start = i;
            used = 0;
        }
        used += size;
    }
    if start < blocks.len() {
        chunks.push(&blocks[start..]);
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PeerMessage;
    use sdupi_ledger::create_genesis_block;
    use sdupi_transactions::{Transaction, TxKind};
    use sdupi_types::{NetworkId, Timestamp};

    fn env(message: PeerMessage) -> Envelope {
        Envelope::new(NetworkId::Dev, message, Timestamp::from_millis(77))
    }

    #[test]
    fn every_variant_decodes_to_itself() {
        let tx = Transaction::new("a", "b", 3, TxKind::Contract, Timestamp::from_millis(5));
        let genesis = create_genesis_block(NetworkId::Dev);
        for message in [
            PeerMessage::SyncRequest,
            PeerMessage::NewTransaction { transaction: tx },
            PeerMessage::NewBlock {
                block: genesis.clone(),
            },
            PeerMessage::FullChain {
                blocks: vec![genesis],
            },
        ] {
            let original = env(message);
            let bytes = encode_envelope(&original).unwrap();
            assert_eq!(decode_envelope(&bytes).unwrap(), original);
        }
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            decode_envelope(&[0xff, 0xff, 0xff, 0xff, 0xff]),
            Err(MessageError::Decode(_))
        ));
    }

    #[test]
    fn empty_input_is_a_decode_error() {
        assert!(matches!(decode_envelope(&[]), Err(MessageError::Decode(_))));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = encode_envelope(&env(PeerMessage::SyncRequest)).unwrap();
        bytes.push(0);
        assert!(decode_envelope(&bytes).is_err());
    }

    #[test]
    fn truncated_input_rejected() {
        let bytes = encode_envelope(&env(PeerMessage::SyncRequest)).unwrap();
        assert!(decode_envelope(&bytes[..bytes.len() - 1]).is_err());
    }

    fn numbered_blocks(count: u64) -> Vec<Block> {
        let genesis = create_genesis_block(NetworkId::Dev);
        (0..count)
            .map(|index| Block {
                index,
                ..genesis.clone()
            })
            .collect()
    }

    #[test]
    fn chain_split_into_ordered_runs_within_budget() {
        let blocks = numbered_blocks(5);
        let size = options().serialized_size(&blocks[4]).unwrap();
        let chunks = chunk_blocks(&blocks, size * 2 + size / 2).unwrap();

        let lens: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(lens, vec![2, 2, 1]);
        let indices: Vec<u64> = chunks.iter().flat_map(|c| c.iter().map(|b| b.index)).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn block_over_budget_is_an_encode_error() {
        let blocks = numbered_blocks(1);
        assert!(matches!(
            chunk_blocks(&blocks, 8),
            Err(MessageError::Encode(_))
        ));
    }

    #[test]
    fn small_chain_is_one_frame() {
        let blocks = numbered_blocks(3);
        let chunks = full_chain_chunks(&blocks).unwrap();
        assert_eq!(chunks.len(), 1);
        let message = PeerMessage::FullChain {
            blocks: chunks[0].to_vec(),
        };
        assert!(encode_envelope(&env(message)).is_ok());
    }
}
