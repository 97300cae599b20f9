//! Bech32 account addresses
//!
//! Address = `bech32(account_prefix, RIPEMD160(SHA256(compressed pubkey)))`,
//! the Cosmos SDK account format. The prefixes are an explicit value
//! handed to every call, validated once when it is built.

use crate::ErrorClass;
use bitcoin::bech32::{self, Bech32, Hrp};
use bitcoin::hashes::{hash160, Hash};
use secp256k1::PublicKey;
use thiserror::Error;

/// Amino type prefix of a secp256k1 public key in legacy bech32 form
const AMINO_SECP256K1_PREFIX: [u8; 5] = [0xEB, 0x5A, 0xE9, 0x87, 0x21];

#[derive(Error, Debug)]
pub enum AddressError {
    #[error("Invalid bech32 prefix {prefix:?}: {reason}")]
    InvalidPrefix { prefix: String, reason: String },
    #[error("Bech32 encoding failed: {0}")]
    Encoding(String),
}

impl AddressError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidPrefix { .. } => ErrorClass::Config,
            Self::Encoding(_) => ErrorClass::Fatal,
        }
    }
}

/// Human-readable prefix pair of a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressConfig {
    account: Hrp,
    pubkey: Hrp,
}

impl AddressConfig {
    pub fn new(account_prefix: &str, pubkey_prefix: &str) -> Result<Self, AddressError> {
        Ok(Self {
            account: parse_prefix(account_prefix)?,
            pubkey: parse_prefix(pubkey_prefix)?,
        })
    }

    /// Sommelier mainnet: `somm` / `sommpub`.
    pub fn sommelier() -> Self {
        Self {
            account: Hrp::parse_unchecked("somm"),
            pubkey: Hrp::parse_unchecked("sommpub"),
        }
    }

    pub fn account_prefix(&self) -> &str {
        self.account.as_str()
    }

    pub fn pubkey_prefix(&self) -> &str {
        self.pubkey.as_str()
    }

    /// Account address of `public_key`.
    pub fn account_address(&self, public_key: &PublicKey) -> Result<String, AddressError> {
        let hash = hash160::Hash::hash(&public_key.serialize());
        encode(self.account, hash.as_byte_array())
    }

    /// Legacy bech32 public key (amino-prefixed compressed key).
    pub fn bech32_public_key(&self, public_key: &PublicKey) -> Result<String, AddressError> {
        let mut payload = Vec::with_capacity(AMINO_SECP256K1_PREFIX.len() + 33);
        payload.extend_from_slice(&AMINO_SECP256K1_PREFIX);
        payload.extend_from_slice(&public_key.serialize());
        encode(self.pubkey, &payload)
    }
}

impl Default for AddressConfig {
    fn default() -> Self {
        Self::sommelier()
    }
}

fn parse_prefix(prefix: &str) -> Result<Hrp, AddressError> {
    let invalid = |reason: String| AddressError::InvalidPrefix {
        prefix: prefix.to_string(),
        reason,
    };
    if prefix.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(invalid("must be lowercase".into()));
    }
    Hrp::parse(prefix).map_err(|e| invalid(e.to_string()))
}

fn encode(hrp: Hrp, data: &[u8]) -> Result<String, AddressError> {
    bech32::encode::<Bech32>(hrp, data).map_err(|e| AddressError::Encoding(e.to_string()))
}
