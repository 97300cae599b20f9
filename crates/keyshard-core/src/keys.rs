//! Hierarchical key derivation (BIP-32) along a BIP-44 path
//!
//! The account key lives at the Cosmos fundraiser path
//! `m/44'/118'/0'/0/0`: hardened purpose, coin type and account, then
//! normal change and address index.
//!
//! Any invalid intermediate key (IL ≥ n, or a zero child) aborts the
//! derivation instead of skipping to the next index. The chance is below
//! 2^-127, so in practice it means corrupted inputs.

use crate::seed::Seed;
use crate::ErrorClass;
use hmac::{Hmac, Mac};
use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey, Signing};
use sha2::Sha512;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use zeroize::Zeroizing;

type HmacSha512 = Hmac<Sha512>;

/// First hardened child index
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// SLIP-44 coin type of the Cosmos family
pub const COSMOS_COIN_TYPE: u32 = 118;

/// Account path used when nothing else is configured
pub const DEFAULT_PATH: &str = "m/44'/118'/0'/0/0";

const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),
    #[error("Derived key at depth {depth} is not a valid secp256k1 scalar")]
    InvalidKey { depth: usize },
}

impl KeyError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidPath(_) => ErrorClass::Input,
            Self::InvalidKey { .. } => ErrorClass::Fatal,
        }
    }
}

/// One path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildNumber(u32);

impl ChildNumber {
    pub fn normal(index: u32) -> Result<Self, KeyError> {
        if index >= HARDENED_OFFSET {
            return Err(KeyError::InvalidPath(format!("index {} out of range", index)));
        }
        Ok(Self(index))
    }

    pub fn hardened(index: u32) -> Result<Self, KeyError> {
        Self::normal(index).map(|c| Self(c.0 | HARDENED_OFFSET))
    }

    pub fn is_hardened(&self) -> bool {
        self.0 >= HARDENED_OFFSET
    }

    /// Index without the hardened bit.
    pub fn index(&self) -> u32 {
        self.0 & !HARDENED_OFFSET
    }

    /// Serialized form fed to CKDpriv.
    pub fn to_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_hardened() {
            write!(f, "{}'", self.index())
        } else {
            write!(f, "{}", self.index())
        }
    }
}

/// Sequence of child numbers from the master key, e.g. `m/44'/118'/0'/0/0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<ChildNumber>);

impl DerivationPath {
    /// `m/44'/coin_type'/account'/change/index`
    pub fn bip44(coin_type: u32, account: u32, change: u32, index: u32) -> Result<Self, KeyError> {
        Ok(Self(vec![
            ChildNumber::hardened(44)?,
            ChildNumber::hardened(coin_type)?,
            ChildNumber::hardened(account)?,
            ChildNumber::normal(change)?,
            ChildNumber::normal(index)?,
        ]))
    }

    /// The Cosmos fundraiser path, `m/44'/118'/0'/0/0`.
    pub fn cosmos() -> Self {
        Self(vec![
            ChildNumber(44 | HARDENED_OFFSET),
            ChildNumber(COSMOS_COIN_TYPE | HARDENED_OFFSET),
            ChildNumber(HARDENED_OFFSET),
            ChildNumber(0),
            ChildNumber(0),
        ])
    }

    pub fn children(&self) -> &[ChildNumber] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl Default for DerivationPath {
    fn default() -> Self {
        Self::cosmos()
    }
}

impl FromStr for DerivationPath {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        if parts.next() != Some("m") {
            return Err(KeyError::InvalidPath(format!("{:?} must start with \"m\"", s)));
        }

        let mut children = Vec::new();
        for part in parts {
            let (digits, hardened) = match part.strip_suffix(&['\'', 'h', 'H'][..]) {
                Some(digits) => (digits, true),
                None => (part, false),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(KeyError::InvalidPath(format!("bad segment {:?}", part)));
            }
            let index: u32 = digits
                .parse()
                .map_err(|_| KeyError::InvalidPath(format!("segment {:?} overflows", part)))?;
            children.push(if hardened {
                ChildNumber::hardened(index)?
            } else {
                ChildNumber::normal(index)?
            });
        }
        Ok(Self(children))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for child in &self.0 {
            write!(f, "/{}", child)?;
        }
        Ok(())
    }
}

/// Private key + chain code at some node of the tree.
///
/// Both halves stay in wiped buffers. A `SecretKey` is only built for the
/// single libsecp256k1 call that needs it and erased right after; the
/// library takes keys and tweaks by value, so copies it makes on its own
/// stack are out of reach.
struct ExtendedKey {
    secret: Zeroizing<[u8; 32]>,
    chain_code: Zeroizing<[u8; 32]>,
}

impl ExtendedKey {
    /// `I = HMAC-SHA512("Bitcoin seed", seed)`
    fn master(seed: &[u8]) -> Result<Self, KeyError> {
        Self::from_hmac(MASTER_HMAC_KEY, seed, |il| {
            let mut key =
                SecretKey::from_slice(il).map_err(|_| KeyError::InvalidKey { depth: 0 })?;
            key.non_secure_erase();
            let mut secret = Zeroizing::new([0u8; 32]);
            secret.copy_from_slice(il);
            Ok(secret)
        })
    }

    /// CKDpriv
    fn child<C: Signing>(
        &self,
        secp: &Secp256k1<C>,
        child: ChildNumber,
        depth: usize,
    ) -> Result<Self, KeyError> {
        let mut data = Zeroizing::new(Vec::with_capacity(37));
        if child.is_hardened() {
            data.push(0x00);
            data.extend_from_slice(&self.secret[..]);
        } else {
            data.extend_from_slice(&public_key_of(secp, &self.secret, depth)?.serialize());
        }
        data.extend_from_slice(&child.to_u32().to_be_bytes());

        Self::from_hmac(&self.chain_code[..], &data, |il| {
            tweak_add(&self.secret, il, depth)
        })
    }

    /// Split an HMAC-SHA512 output into key (via `make_key`) and chain code.
    fn from_hmac(
        key: &[u8],
        data: &[u8],
        make_key: impl FnOnce(&[u8]) -> Result<Zeroizing<[u8; 32]>, KeyError>,
    ) -> Result<Self, KeyError> {
        // HMAC accepts keys of any length
        let mut mac = HmacSha512::new_from_slice(key)
            .map_err(|_| KeyError::InvalidKey { depth: 0 })?;
        mac.update(data);

        let mut output = Zeroizing::new([0u8; 64]);
        output.copy_from_slice(&mac.finalize().into_bytes());

        let secret = make_key(&output[..32])?;
        let mut chain_code = Zeroizing::new([0u8; 32]);
        chain_code.copy_from_slice(&output[32..]);
        Ok(Self { secret, chain_code })
    }
}

/// Compressed public key of a raw private scalar.
fn public_key_of<C: Signing>(
    secp: &Secp256k1<C>,
    secret: &[u8; 32],
    depth: usize,
) -> Result<PublicKey, KeyError> {
    let mut key = SecretKey::from_slice(secret).map_err(|_| KeyError::InvalidKey { depth })?;
    let public = PublicKey::from_secret_key(secp, &key);
    key.non_secure_erase();
    Ok(public)
}

/// `(parent + il) mod n`. Fails if `il >= n` or the sum is zero.
fn tweak_add(
    parent: &[u8; 32],
    il: &[u8],
    depth: usize,
) -> Result<Zeroizing<[u8; 32]>, KeyError> {
    let mut tweak_bytes = Zeroizing::new([0u8; 32]);
    tweak_bytes.copy_from_slice(il);
    let tweak = Scalar::from_be_bytes(*tweak_bytes).map_err(|_| KeyError::InvalidKey { depth })?;

    let mut key = SecretKey::from_slice(parent).map_err(|_| KeyError::InvalidKey { depth })?;
    let sum = key.add_tweak(&tweak);
    key.non_secure_erase();

    let mut child = sum.map_err(|_| KeyError::InvalidKey { depth })?;
    let bytes = Zeroizing::new(child.secret_bytes());
    child.non_secure_erase();
    Ok(bytes)
}

fn derive_extended<C: Signing>(
    secp: &Secp256k1<C>,
    seed: &[u8],
    path: &DerivationPath,
) -> Result<ExtendedKey, KeyError> {
    let mut node = ExtendedKey::master(seed)?;
    for (i, child) in path.children().iter().enumerate() {
        node = node.child(secp, *child, i + 1)?;
    }
    Ok(node)
}

/// Account key pair. The private scalar is erased on drop.
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Rebuild a key pair from a raw 32-byte private key.
    pub fn from_private_key(bytes: &[u8]) -> Result<Self, KeyError> {
        let secret =
            SecretKey::from_slice(bytes).map_err(|_| KeyError::InvalidKey { depth: 0 })?;
        let public = PublicKey::from_secret_key(&Secp256k1::signing_only(), &secret);
        Ok(Self { secret, public })
    }

    pub fn private_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.secret.secret_bytes())
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// SEC1 compressed public key.
    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public.serialize()
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.secret.non_secure_erase();
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Derive the key pair at `path` below the master key of `seed`.
pub fn derive_keypair(seed: &Seed, path: &DerivationPath) -> Result<KeyPair, KeyError> {
    let secp = Secp256k1::signing_only();
    let node = derive_extended(&secp, seed.as_bytes(), path)?;
    log::debug!("derived account key at {}", path);

    KeyPair::from_private_key(&node.secret[..])
}
