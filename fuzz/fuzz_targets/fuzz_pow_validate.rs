#![no_main]

use libfuzzer_sys::fuzz_target;

use sdupi_types::{BlockHash, TxHash};
use sdupi_work::{validate_work, DifficultyPrefix};

fuzz_target!(|data: &[u8]| {
    // index (8) + previous hash (32) + nonce (8) + merkle root (32).
    if data.len() < 80 {
        return;
    }
    let index = u64::from_be_bytes(data[0..8].try_into().unwrap());
    let previous = BlockHash::new(data[8..40].try_into().unwrap());
    let nonce = u64::from_be_bytes(data[40..48].try_into().unwrap());
    let merkle = TxHash::new(data[48..80].try_into().unwrap());

    // The tail is tried as a difficulty prefix; junk must be rejected, not panic.
    let tail = String::from_utf8_lossy(&data[80..]);
    let prefix = DifficultyPrefix::parse(&tail).unwrap_or_default();

    let _ = validate_work(index, &previous, nonce, &merkle, &prefix);
});
