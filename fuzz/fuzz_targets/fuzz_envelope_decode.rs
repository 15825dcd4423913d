#![no_main]

use libfuzzer_sys::fuzz_target;

use sdupi_types::NetworkId;

fuzz_target!(|data: &[u8]| {
    // Peer frames arrive straight off the socket.
    if let Ok(envelope) = sdupi_messages::decode_envelope(data) {
        let _ = envelope.check(NetworkId::Dev);
        let _ = envelope.message.kind();
        // Anything that decodes must encode again.
        assert!(sdupi_messages::encode_envelope(&envelope).is_ok());
    }
});
