use std::sync::Arc;

use proptest::prelude::*;

use sdupi_crypto::ProducerIdentity;
use sdupi_ledger::{Block, BlockBuilder, LedgerError, LedgerStore};
use sdupi_nullables::NullClock;
use sdupi_transactions::{Transaction, TxKind};
use sdupi_types::{NetworkId, Timestamp};
use sdupi_work::DifficultyPrefix;

fn batch(block: usize, count: usize) -> Vec<Transaction> {
    (0..count)
        .map(|i| {
            Transaction::new(
                format!("sender-{block}"),
                format!("receiver-{i}"),
                (i + 1) as u64,
                TxKind::Transfer,
                Timestamp::from_millis(block as u64),
            )
        })
        .collect()
}

fn chain(sizes: &[usize]) -> LedgerStore {
    let builder = BlockBuilder::new(Arc::new(NullClock::new(1_000)));
    let producer = ProducerIdentity::keyed("prop-node").unwrap();
    let mut store = LedgerStore::new(NetworkId::Dev);
    for (i, &n) in sizes.iter().enumerate() {
        let built = builder.build(
            store.chain_tip(),
            batch(i, n),
            &producer,
            &DifficultyPrefix::default(),
            1,
        );
        store.append(built.block).unwrap();
    }
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every chain built through the builder satisfies all link invariants.
    #[test]
    fn built_chains_verify(sizes in prop::collection::vec(0usize..8, 0..6)) {
        let store = chain(&sizes);
        prop_assert_eq!(store.height(), sizes.len() as u64);
        prop_assert_eq!(store.total_transactions(), sizes.iter().sum::<usize>() as u64);
        prop_assert!(store.verify_chain().is_ok());
        for pair in store.blocks().windows(2) {
            prop_assert_eq!(pair[1].index, pair[0].index + 1);
            prop_assert_eq!(pair[1].previous_hash, pair[0].hash);
        }
    }

    /// Editing any transaction's amount in the tip block, without re-hashing
    /// it, changes the Merkle root and makes the block unappendable.
    #[test]
    fn tampered_tip_rejected(sizes in prop::collection::vec(1usize..6, 1..4), pick in any::<prop::sample::Index>()) {
        let store = chain(&sizes);
        let mut tip = store.tip().clone();
        let i = pick.index(tip.transactions.len());
        tip.transactions[i].amount += 1;
        prop_assert_ne!(tip.compute_merkle_root(), tip.merkle_root);

        let mut partial = LedgerStore::new(NetworkId::Dev);
        let prefix = &store.blocks()[1..store.blocks().len() - 1];
        prop_assert_eq!(partial.extend_from(prefix).appended, prefix.len());
        prop_assert_eq!(
            partial.append(tip),
            Err(LedgerError::InvalidMerkleRoot { index: store.height() })
        );
    }

    /// A chain shipped through its bincode wire form still applies in full.
    #[test]
    fn decoded_chain_applies(sizes in prop::collection::vec(0usize..5, 1..4)) {
        let store = chain(&sizes);
        let bytes = bincode::serialize(store.blocks()).unwrap();
        let blocks: Vec<Block> = bincode::deserialize(&bytes).unwrap();

        let mut replica = LedgerStore::new(NetworkId::Dev);
        let ext = replica.extend_from(&blocks);
        prop_assert_eq!(ext.appended, sizes.len());
        prop_assert_eq!(replica.tip().hash, store.tip().hash);
    }
}
