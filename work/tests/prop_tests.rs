use proptest::prelude::*;

use sdupi_types::{BlockHash, TxHash};
use sdupi_work::{validate_work, DifficultyPrefix, WorkGenerator};

proptest! {
    /// A nonce reported as meeting the target always validates.
    #[test]
    fn found_nonce_always_valid(
        index in 0u64..1_000,
        root_byte in 0u8..=255,
        prefix in "[0-9a-f]{0,2}",
    ) {
        let prev = BlockHash::new([index as u8; 32]);
        let root = TxHash::new([root_byte; 32]);
        let prefix = DifficultyPrefix::parse(&prefix).unwrap();
        let out = WorkGenerator::default().search(index, &prev, &root, &prefix, 50_000);
        if out.met_target {
            prop_assert!(validate_work(index, &prev, out.nonce, &root, &prefix));
        }
        prop_assert_eq!(out.hash.to_string().starts_with(prefix.as_str()), out.met_target);
    }

    /// The batch size never changes the chosen nonce.
    #[test]
    fn batch_size_does_not_affect_result(
        root_byte in 0u8..=255,
        batch in 1u64..512,
        cap in 1u64..3_000,
    ) {
        let root = TxHash::new([root_byte; 32]);
        let prefix = DifficultyPrefix::parse("000").unwrap();
        let a = WorkGenerator::with_batch_size(batch).search(1, &BlockHash::ZERO, &root, &prefix, cap);
        let b = WorkGenerator::with_batch_size(1).search(1, &BlockHash::ZERO, &root, &prefix, cap);
        prop_assert_eq!(a, b);
    }

    /// Iterations never exceed the cap.
    #[test]
    fn iterations_bounded_by_cap(cap in 1u64..2_000) {
        let prefix = DifficultyPrefix::parse(&"f".repeat(12)).unwrap();
        let out = WorkGenerator::default().search(5, &BlockHash::ZERO, &TxHash::ZERO, &prefix, cap);
        prop_assert!(out.iterations <= cap);
        prop_assert!(out.nonce < cap);
    }
}
