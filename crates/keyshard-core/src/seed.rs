//! Seed derivation
//!
//! `PBKDF2-HMAC-SHA512(password = mnemonic, salt = "mnemonic" || passphrase)`
//! with 4096 rounds and a 64-byte output, the BIP-39 seed function.
//! Inputs are used as raw UTF-8 with no NFKD normalisation.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use zeroize::Zeroizing;

pub const SEED_LEN: usize = 64;
pub const PBKDF2_ROUNDS: u32 = 4096;
const SALT_PREFIX: &str = "mnemonic";

/// 64-byte root key material. Wiped on drop.
pub struct Seed(Zeroizing<[u8; SEED_LEN]>);

impl Seed {
    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Seed(redacted)")
    }
}

/// Derive the seed for `mnemonic` under `passphrase` (may be empty).
pub fn derive_seed(mnemonic: &str, passphrase: &str) -> Seed {
    let mut salt = Zeroizing::new(String::with_capacity(SALT_PREFIX.len() + passphrase.len()));
    salt.push_str(SALT_PREFIX);
    salt.push_str(passphrase);

    let mut seed = Zeroizing::new([0u8; SEED_LEN]);
    pbkdf2_hmac::<Sha512>(
        mnemonic.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ROUNDS,
        &mut seed[..],
    );
    Seed(seed)
}
