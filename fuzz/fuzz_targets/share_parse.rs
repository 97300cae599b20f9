#![no_main]

use libfuzzer_sys::fuzz_target;
use keyshard_shamir::Share;

fuzz_target!(|data: &[u8]| {
    // Share files are raw bytes; parsing must never panic and an accepted
    // share must write back to the same bytes.
    if let Ok(share) = Share::from_bytes(data) {
        assert_ne!(share.index(), 0);
        assert_eq!(share.to_bytes(), data);
    }
});
