#![no_main]

use libfuzzer_sys::fuzz_target;
use keyshard_core::Mnemonic;

fuzz_target!(|data: &[u8]| {
    // Any UTF-8 input must parse to Ok or Err, and an accepted phrase
    // must survive a second parse unchanged.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(mnemonic) = Mnemonic::parse(s) {
            let again = Mnemonic::parse(mnemonic.as_str()).unwrap();
            assert_eq!(again, mnemonic);
            assert_eq!(mnemonic.word_count() % 3, 0);
        }
    }
});
