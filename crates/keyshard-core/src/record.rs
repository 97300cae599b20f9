//! The secret half of an account, as split into shares
//!
//! Wire format is compact JSON with the keys in this order:
//!
//! ```json
//! {"mnemonic":"word word …","privateKey":"<base64 of the 32-byte key>"}
//! ```
//!
//! The bytes produced by [`SensitiveRecord::to_bytes`] are exactly what
//! gets split, and reconstruction must give them back unchanged.

use crate::keys::KeyPair;
use crate::mnemonic::Mnemonic;
use crate::ErrorClass;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Record serialization failed: {0}")]
    Serialize(String),
    #[error("Reconstructed data is not a valid record: {0}")]
    Malformed(String),
    #[error("Record private key is not a base64-encoded 32-byte key")]
    InvalidPrivateKey,
}

impl RecordError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Serialize(_) => ErrorClass::Fatal,
            Self::Malformed(_) | Self::InvalidPrivateKey => ErrorClass::Reconstruction,
        }
    }
}

/// `{mnemonic, privateKey}`. Wiped on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SensitiveRecord {
    mnemonic: String,
    private_key: String,
}

impl SensitiveRecord {
    pub fn new(mnemonic: &Mnemonic, keys: &KeyPair) -> Self {
        Self {
            mnemonic: mnemonic.as_str().to_string(),
            private_key: BASE64.encode(&keys.private_key_bytes()[..]),
        }
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    /// Base64 form of the private key, as displayed.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Decode the base64 private key.
    pub fn private_key_bytes(&self) -> Result<Zeroizing<Vec<u8>>, RecordError> {
        let bytes = Zeroizing::new(
            BASE64
                .decode(&self.private_key)
                .map_err(|_| RecordError::InvalidPrivateKey)?,
        );
        if bytes.len() != 32 {
            return Err(RecordError::InvalidPrivateKey);
        }
        Ok(bytes)
    }

    /// Exact payload for secret sharing.
    pub fn to_bytes(&self) -> Result<Zeroizing<Vec<u8>>, RecordError> {
        serde_json::to_vec(self)
            .map(Zeroizing::new)
            .map_err(|e| RecordError::Serialize(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        // serde_json messages can quote input, so only the position is kept
        serde_json::from_slice(bytes).map_err(|e| {
            RecordError::Malformed(format!(
                "{:?} error at line {} column {}",
                e.classify(),
                e.line(),
                e.column()
            ))
        })
    }
}

impl std::fmt::Debug for SensitiveRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SensitiveRecord(redacted)")
    }
}
