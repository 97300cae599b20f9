//! Security-specific tests.
//!
//! These tests verify:
//! 1. Malformed user input is rejected before anything is derived
//! 2. Secrets never show up in Debug output or error messages
//! 3. Malformed and corrupted shares are rejected, never silently combined
//! 4. Arbitrary bytes never make the share and record parsers panic

use keyshard_core::memory::{disable_core_dumps, LockedBuffer};
use keyshard_core::{
    derive_keypair, derive_seed, generate_account, mix_entropy, AccountParams, DerivationPath,
    EntropyError, ErrorClass, Mnemonic, SensitiveRecord,
};
use keyshard_shamir::{combine_shares, split_secret, ShamirError, Share};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

const USER_ENTROPY: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

// ============================================================================
// 1. Input Rejection
// ============================================================================

#[test]
fn test_short_user_entropy_rejected() {
    let err = mix_entropy(24, &"x".repeat(32)).unwrap_err();
    assert!(matches!(err, EntropyError::UserEntropyTooShort(32)));
    assert_eq!(err.class(), ErrorClass::Input);

    assert!(mix_entropy(24, &"x".repeat(33)).is_ok());
}

#[test]
fn test_word_count_must_be_multiple_of_three() {
    for words in [0usize, 1, 2, 4, 13, 25] {
        assert!(mix_entropy(words, USER_ENTROPY).is_err(), "{} words", words);
    }
}

#[test]
fn test_unknown_word_rejected() {
    assert!(Mnemonic::parse("abandon abandon bitcoin").is_err());
    assert!(Mnemonic::parse("").is_err());
}

#[test]
fn test_malformed_paths_rejected() {
    for path in ["", "44'/118'", "m/", "m//0", "m/-1", "m/2147483648", "m/1''", "m/a"] {
        assert!(path.parse::<DerivationPath>().is_err(), "{:?}", path);
    }
}

// ============================================================================
// 2. Redaction
// ============================================================================

#[test]
fn test_debug_output_is_redacted() {
    let account = generate_account(&AccountParams::default(), USER_ENTROPY, "").unwrap();
    let record = account.sensitive_record();
    let first_word = account.mnemonic().words().next().unwrap().to_string();

    let debug = format!("{:?} {:?} {:?}", account, record, account.keys());
    assert!(!debug.contains(record.private_key()));
    assert!(!debug.contains(&hex::encode(&account.keys().private_key_bytes()[..])));
    assert!(!debug.contains(account.mnemonic().as_str()));
    assert!(!debug.contains(&format!("\"{}", first_word)));

    let seed = derive_seed(account.mnemonic().as_str(), "");
    assert!(!format!("{:?}", seed).contains(&hex::encode(&seed.as_bytes()[..4])));
}

#[test]
fn test_record_parse_error_does_not_echo_secret() {
    let bytes = br#"{"mnemonic":"zoo zoo zoo","privateKey":"c2VjcmV0","extra":1}"#;
    let err = SensitiveRecord::from_bytes(bytes).unwrap_err();
    let message = err.to_string();
    assert!(!message.contains("zoo"));
    assert!(!message.contains("c2VjcmV0"));
}

#[test]
fn test_locked_buffer_debug() {
    let mut buf = LockedBuffer::new(16);
    buf.as_mut_slice().fill(0xAB);
    let debug = format!("{:?}", buf);
    assert!(!debug.to_lowercase().contains("ab, "));
    assert!(!debug.contains("171"));
    assert_eq!(buf.as_slice(), &[0xAB; 16]);
}

#[test]
fn test_disable_core_dumps_is_idempotent() {
    let first = disable_core_dumps();
    assert_eq!(disable_core_dumps(), first);
}

// ============================================================================
// 3. Share Validation
// ============================================================================

#[test]
fn test_every_single_bit_flip_in_extra_share_detected() {
    let secret = b"{\"mnemonic\":\"abandon\"}";
    let set = split_secret(secret, 4, 3).unwrap();
    let clean = set.shares().to_vec();

    for pos in 1..clean[3].to_bytes().len() {
        let mut bytes = clean[3].to_bytes();
        bytes[pos] ^= 0x80;
        let mut shares = clean.clone();
        shares[3] = Share::from_bytes(&bytes).unwrap();

        assert!(
            matches!(
                combine_shares(&shares, 3),
                Err(ShamirError::InconsistentShares { index: 4 })
            ),
            "flip at byte {}",
            pos
        );
    }
}

#[test]
fn test_below_threshold_reveals_nothing_usable() {
    // Forcing a lower threshold interpolates a different polynomial,
    // so the output is unrelated to the secret.
    let secret = [0x42u8; 32];
    let set = split_secret(&secret, 5, 3).unwrap();
    let guess = combine_shares(&set.shares()[..2], 2).unwrap();
    assert_ne!(&guess[..], &secret[..]);
}

#[test]
fn test_share_tag_zero_rejected() {
    let set = split_secret(b"tag", 3, 2).unwrap();
    let mut bytes = set.shares()[0].to_bytes();
    bytes[0] = 0;
    assert!(matches!(
        Share::from_bytes(&bytes),
        Err(ShamirError::InvalidShare(_))
    ));
}

#[test]
fn test_relabelled_share_breaks_consistency() {
    let set = split_secret(b"relabel me", 5, 2).unwrap();
    let mut shares = set.select(&[1, 2, 3]).unwrap();
    let mut bytes = shares[2].to_bytes();
    bytes[0] = 4;
    shares[2] = Share::from_bytes(&bytes).unwrap();

    assert!(matches!(
        combine_shares(&shares, 2),
        Err(ShamirError::InconsistentShares { index: 4 })
    ));
}

// ============================================================================
// 4. Parser Robustness
// ============================================================================

#[test]
fn test_random_bytes_never_panic_share_parsing() {
    let mut rng = StdRng::seed_from_u64(0xFEED);
    for _ in 0..2000 {
        let len = rng.gen_range(0..64);
        let mut bytes = vec![0u8; len];
        rng.fill_bytes(&mut bytes);
        let _ = Share::from_bytes(&bytes);
    }
}

#[test]
fn test_random_shares_never_panic_combine() {
    let mut rng = StdRng::seed_from_u64(0xBEEF);
    for _ in 0..500 {
        let count = rng.gen_range(0..6);
        let shares: Vec<Share> = (0..count)
            .filter_map(|_| {
                let len = rng.gen_range(0..8);
                let mut bytes = vec![0u8; len];
                rng.fill_bytes(&mut bytes);
                Share::from_bytes(&bytes).ok()
            })
            .collect();
        let threshold = rng.gen_range(0..4);
        let _ = combine_shares(&shares, threshold);
    }
}

#[test]
fn test_random_bytes_never_panic_record_parsing() {
    let mut rng = StdRng::seed_from_u64(0xC0DE);
    for _ in 0..2000 {
        let len = rng.gen_range(0..96);
        let mut bytes = vec![0u8; len];
        rng.fill_bytes(&mut bytes);
        let _ = SensitiveRecord::from_bytes(&bytes);
    }
}

#[test]
fn test_private_key_of_derived_account_is_valid_scalar() {
    let seed = derive_seed("zoo zoo zoo", "");
    let keys = derive_keypair(&seed, &DerivationPath::default()).unwrap();
    assert!(keyshard_core::KeyPair::from_private_key(&keys.private_key_bytes()[..]).is_ok());
}
