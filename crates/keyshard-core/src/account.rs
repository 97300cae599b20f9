//! Account generation pipeline
//!
//! Entropy → Mnemonic → Seed → KeyPair → Address. Each intermediate
//! secret is dropped, and so wiped, as soon as the next step has consumed
//! it. An early `?` return wipes it the same way.

use crate::address::{AddressConfig, AddressError};
use crate::entropy::{mix_entropy_with_rng, EntropyError};
use crate::keys::{derive_keypair, DerivationPath, KeyError, KeyPair};
use crate::mnemonic::{encode, Mnemonic, MnemonicError};
use crate::record::SensitiveRecord;
use crate::seed::derive_seed;
use crate::ErrorClass;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::Serialize;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Default mnemonic length
pub const DEFAULT_WORD_COUNT: usize = 24;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error(transparent)]
    Entropy(#[from] EntropyError),
    #[error(transparent)]
    Mnemonic(#[from] MnemonicError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Address(#[from] AddressError),
}

impl AccountError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Entropy(e) => e.class(),
            Self::Mnemonic(e) => e.class(),
            Self::Key(e) => e.class(),
            Self::Address(e) => e.class(),
        }
    }
}

/// Everything about an account that is not secret input.
#[derive(Debug, Clone)]
pub struct AccountParams {
    pub word_count: usize,
    pub path: DerivationPath,
    pub address: AddressConfig,
}

impl Default for AccountParams {
    fn default() -> Self {
        Self {
            word_count: DEFAULT_WORD_COUNT,
            path: DerivationPath::default(),
            address: AddressConfig::default(),
        }
    }
}

/// A derived account.
#[derive(Debug)]
pub struct Account {
    mnemonic: Mnemonic,
    keys: KeyPair,
    address: String,
    bech32_public_key: String,
}

impl Account {
    pub fn mnemonic(&self) -> &Mnemonic {
        &self.mnemonic
    }

    pub fn keys(&self) -> &KeyPair {
        &self.keys
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Public key under the configured pubkey prefix, e.g. `sommpub1...`.
    pub fn bech32_public_key(&self) -> &str {
        &self.bech32_public_key
    }

    /// The `{mnemonic, privateKey}` payload to split.
    pub fn sensitive_record(&self) -> SensitiveRecord {
        SensitiveRecord::new(&self.mnemonic, &self.keys)
    }

    /// Operator-facing summary with base64 keys.
    pub fn display(&self) -> AccountDisplay {
        let record = self.sensitive_record();
        AccountDisplay {
            address: self.address.clone(),
            mnemonic: record.mnemonic().to_string(),
            private_key: record.private_key().to_string(),
            public_key: BASE64.encode(self.keys.public_key_bytes()),
            bech32_public_key: self.bech32_public_key.clone(),
        }
    }
}

/// JSON view printed after generation.
#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct AccountDisplay {
    pub address: String,
    pub mnemonic: String,
    pub private_key: String,
    pub public_key: String,
    pub bech32_public_key: String,
}

/// Generate a fresh account from OS randomness mixed with `user_entropy`.
pub fn generate_account(
    params: &AccountParams,
    user_entropy: &str,
    passphrase: &str,
) -> Result<Account, AccountError> {
    generate_account_with_rng(&mut OsRng, params, user_entropy, passphrase)
}

/// [`generate_account`] with a caller-supplied CSPRNG.
pub fn generate_account_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    params: &AccountParams,
    user_entropy: &str,
    passphrase: &str,
) -> Result<Account, AccountError> {
    let entropy = mix_entropy_with_rng(rng, params.word_count, user_entropy)?;
    let mnemonic = encode(entropy.as_bytes())?;
    drop(entropy);

    derive_account(mnemonic, passphrase, params)
}

/// Derive the account behind an existing mnemonic.
pub fn derive_account(
    mnemonic: Mnemonic,
    passphrase: &str,
    params: &AccountParams,
) -> Result<Account, AccountError> {
    let seed = derive_seed(mnemonic.as_str(), passphrase);
    let keys = derive_keypair(&seed, &params.path)?;
    drop(seed);

    let address = params.address.account_address(keys.public_key())?;
    let bech32_public_key = params.address.bech32_public_key(keys.public_key())?;
    log::debug!(
        "derived {}-word account {} at {}",
        mnemonic.word_count(),
        address,
        params.path
    );

    Ok(Account {
        mnemonic,
        keys,
        address,
        bech32_public_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const USER: &str = "correct horse battery staple correct horse battery";

    #[test]
    fn test_generate_default_account() {
        let account = generate_account(&AccountParams::default(), USER, "").unwrap();
        assert_eq!(account.mnemonic().word_count(), 24);
        assert!(account.address().starts_with("somm1"));
    }

    #[test]
    fn test_generation_is_deterministic_for_fixed_rng() {
        let params = AccountParams::default();
        let a = generate_account_with_rng(&mut StdRng::seed_from_u64(3), &params, USER, "pw")
            .unwrap();
        let b = generate_account_with_rng(&mut StdRng::seed_from_u64(3), &params, USER, "pw")
            .unwrap();
        assert_eq!(a.mnemonic(), b.mnemonic());
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn test_derive_account_matches_generation() {
        let params = AccountParams::default();
        let generated =
            generate_account_with_rng(&mut StdRng::seed_from_u64(5), &params, USER, "pw").unwrap();
        let derived = derive_account(generated.mnemonic().clone(), "pw", &params).unwrap();
        assert_eq!(derived.address(), generated.address());
        assert_eq!(
            *derived.keys().private_key_bytes(),
            *generated.keys().private_key_bytes()
        );
    }

    #[test]
    fn test_display_fields() {
        let account = generate_account(&AccountParams::default(), USER, "").unwrap();
        let display = account.display();
        assert_eq!(display.address, account.address());
        assert_eq!(display.mnemonic, account.mnemonic().as_str());
        assert_eq!(display.public_key.len(), 44);

        let json = serde_json::to_value(&display).unwrap();
        assert!(display.bech32_public_key.starts_with("sommpub1"));
        for key in ["address", "mnemonic", "privateKey", "publicKey", "bech32PublicKey"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_errors_keep_their_class() {
        let params = AccountParams {
            word_count: 10,
            ..Default::default()
        };
        let err = generate_account(&params, USER, "").unwrap_err();
        assert_eq!(err.class(), ErrorClass::Input);

        let err = generate_account(&AccountParams::default(), "short", "").unwrap_err();
        assert!(matches!(err, AccountError::Entropy(EntropyError::UserEntropyTooShort(5))));
    }

    #[test]
    fn test_custom_path_and_prefix() {
        let params = AccountParams {
            word_count: 12,
            path: "m/44'/118'/0'/0/7".parse().unwrap(),
            address: AddressConfig::new("cosmos", "cosmospub").unwrap(),
        };
        let account = generate_account(&params, USER, "").unwrap();
        assert_eq!(account.mnemonic().word_count(), 12);
        assert!(account.address().starts_with("cosmos1"));
        assert!(account.bech32_public_key().starts_with("cosmospub1"));
    }
}
