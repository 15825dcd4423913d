use proptest::prelude::*;

use sdupi_transactions::{validate_transaction, Transaction, TxKind};
use sdupi_types::Timestamp;

fn kind() -> impl Strategy<Value = TxKind> {
    prop_oneof![
        Just(TxKind::Transfer),
        Just(TxKind::Contract),
        Just(TxKind::Other)
    ]
}

proptest! {
    /// Any transaction built through `new` with non-empty parties and a
    /// positive amount validates.
    #[test]
    fn constructed_transactions_validate(
        sender in "[a-z0-9]{1,16}",
        receiver in "[a-z0-9]{1,16}",
        amount in 1u64..,
        kind in kind(),
        ts in any::<u64>(),
    ) {
        let tx = Transaction::new(sender, receiver, amount, kind, Timestamp::from_millis(ts));
        prop_assert!(validate_transaction(&tx).is_ok());
    }

    /// Changing the amount after construction always invalidates the hash.
    #[test]
    fn amount_tamper_detected(amount in 1u64..u64::MAX, delta in 1u64..1000) {
        let mut tx = Transaction::new("a", "b", amount, TxKind::Transfer, Timestamp::from_millis(7));
        tx.amount = amount.wrapping_add(delta).max(1);
        prop_assume!(tx.amount != amount);
        prop_assert!(validate_transaction(&tx).is_err());
    }
}
