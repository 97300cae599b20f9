#![no_main]

use libfuzzer_sys::fuzz_target;
use keyshard_shamir::{combine_shares, split_secret, Share};

fuzz_target!(|data: &[u8]| {
    let Some((&params, rest)) = data.split_first() else {
        return;
    };

    // Round trip: split the input and rebuild it from the last t shares.
    let total = (params >> 4).max(1);
    let threshold = (params & 0x0F).clamp(1, total);
    if !rest.is_empty() {
        let set = split_secret(rest, total, threshold).unwrap();
        let start = set.len() - threshold as usize;
        let secret = combine_shares(&set.shares()[start..], threshold).unwrap();
        assert_eq!(&secret[..], rest);
    }

    // Arbitrary shares: chunks of the input, must return Ok or Err.
    let shares: Vec<Share> = rest
        .chunks(5)
        .filter_map(|chunk| Share::from_bytes(chunk).ok())
        .collect();
    let _ = combine_shares(&shares, threshold);
});
