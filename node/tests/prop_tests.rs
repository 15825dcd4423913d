use std::sync::Arc;

use proptest::prelude::*;

use sdupi_node::{MetricsTracker, PoolError, TransactionPool};
use sdupi_nullables::NullClock;
use sdupi_transactions::{Transaction, TxKind};
use sdupi_types::Timestamp;

fn tx(n: u64) -> Transaction {
    Transaction::new("alice", "bob", n + 1, TxKind::Transfer, Timestamp::from_millis(n))
}

proptest! {
    /// K samples spaced `dt` apart inside a window W >= K*dt give K / W.
    #[test]
    fn throughput_matches_count_over_window(
        k in 1u64..500,
        dt_ms in 1u64..2_000,
        slack_ms in 0u64..10_000,
    ) {
        let window_ms = k * dt_ms + slack_ms;
        let now = 10_000_000u64;
        let mut tracker = MetricsTracker::new(Arc::new(NullClock::new(now)));
        for i in (0..k).rev() {
            tracker.record_at(1, Timestamp::from_millis(now - i * dt_ms));
        }
        let rate = tracker.throughput_at(window_ms, Timestamp::from_millis(now));
        let expected = k as f64 / (window_ms as f64 / 1000.0);
        prop_assert!((rate - expected).abs() < 1e-9);
    }

    /// Whatever is submitted, each hash is pooled at most once.
    #[test]
    fn pool_never_holds_duplicates(ids in prop::collection::vec(0u64..50, 0..200)) {
        let mut pool = TransactionPool::new(1_000, Arc::new(NullClock::new(0)));
        let mut distinct = std::collections::HashSet::new();
        for id in &ids {
            let result = pool.submit(tx(*id));
            if distinct.insert(*id) {
                prop_assert!(result.is_ok());
            } else {
                prop_assert!(matches!(result, Err(PoolError::DuplicateHash(_))));
            }
        }
        prop_assert_eq!(pool.size(), distinct.len());
    }

    /// Draining in batches returns every pooled transaction exactly once, in
    /// submission order.
    #[test]
    fn drains_conserve_order(count in 0u64..300, batch in 1usize..64) {
        let mut pool = TransactionPool::new(1_000, Arc::new(NullClock::new(0)));
        for n in 0..count {
            pool.submit(tx(n)).unwrap();
        }
        let mut drained = Vec::new();
        loop {
            let next = pool.drain_batch(batch);
            if next.is_empty() {
                break;
            }
            prop_assert!(next.len() <= batch);
            drained.extend(next);
        }
        prop_assert!(pool.is_empty());
        let amounts: Vec<u64> = drained.iter().map(|t| t.amount).collect();
        let expected: Vec<u64> = (1..=count).collect();
        prop_assert_eq!(amounts, expected);
    }
}
