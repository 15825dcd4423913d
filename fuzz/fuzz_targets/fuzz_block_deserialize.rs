#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Malformed bytes must never panic, and whatever decodes must be safe
    // to hash and verify.
    if let Ok(tx) = bincode::deserialize::<sdupi_transactions::Transaction>(data) {
        let _ = tx.hash_matches();
        let _ = sdupi_transactions::validate_transaction(&tx);
    }

    if let Ok(block) = bincode::deserialize::<sdupi_ledger::Block>(data) {
        let _ = block.compute_hash();
        let _ = block.compute_merkle_root();
        let _ = block.verify_signature();
    }

    let _ = bincode::deserialize::<sdupi_types::BlockHash>(data);
    let _ = bincode::deserialize::<sdupi_types::TxHash>(data);
});
