//! keyshard Core
//!
//! Deterministic account derivation from mixed entropy.
//!
//! # Pipeline
//!
//! ```text
//! OS CSPRNG ⊕ SHA-512(user entropy)  → Entropy
//! Entropy (11 bits per word)          → Mnemonic
//! PBKDF2-HMAC-SHA512(mnemonic)        → Seed (64 bytes)
//! BIP-32 walk m/44'/118'/0'/0/0       → KeyPair
//! bech32(HASH160(pubkey))             → Address
//! ```
//!
//! The mnemonic has no checksum word, so it is not interchangeable with
//! BIP-39 wallets. The secret half of an account (mnemonic + private key)
//! is serialized as a [`SensitiveRecord`] for `keyshard-shamir` to split.
//!
//! Entropy, seeds and private keys are wiped when dropped.

pub mod account;
pub mod address;
pub mod entropy;
pub mod keys;
pub mod memory;
pub mod mnemonic;
pub mod record;
pub mod seed;

pub use account::{derive_account, generate_account, Account, AccountError, AccountParams};
pub use address::{AddressConfig, AddressError};
pub use entropy::{mix_entropy, Entropy, EntropyError};
pub use keys::{derive_keypair, DerivationPath, KeyError, KeyPair};
pub use mnemonic::{encode, Mnemonic, MnemonicError};
pub use record::{RecordError, SensitiveRecord};
pub use seed::{derive_seed, Seed};

/// Failure category shared by every keyshard error type.
///
/// All of them abort the run. The category only decides what the
/// operator is told and which exit code the CLI uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed user input: entropy length, word count, path, phrase.
    Input,
    /// Invalid sharing or address parameters.
    Config,
    /// RNG, arithmetic or I/O failure.
    Fatal,
    /// Missing, inconsistent or corrupted shares.
    Reconstruction,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Input => "input error",
            Self::Config => "configuration error",
            Self::Fatal => "fatal error",
            Self::Reconstruction => "reconstruction error",
        };
        f.write_str(name)
    }
}
