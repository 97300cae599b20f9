//! Entropy mixing
//!
//! The mnemonic entropy is the OS random stream XORed with the SHA-512
//! digest of a user-typed string, repeating the 64-byte digest across
//! longer buffers. A weak or backdoored system RNG alone is then not
//! enough to predict the result.

use crate::memory::LockedBuffer;
use crate::ErrorClass;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};
use thiserror::Error;
use zeroize::Zeroize;

/// Minimum number of characters of user entropy
pub const MIN_USER_ENTROPY_CHARS: usize = 33;

/// Bits encoded by one mnemonic word
pub const BITS_PER_WORD: usize = 11;

#[derive(Error, Debug)]
pub enum EntropyError {
    #[error("Word count must be a positive multiple of 3, got {0}")]
    InvalidWordCount(usize),
    #[error("User entropy must be at least 33 characters, got {0}")]
    UserEntropyTooShort(usize),
    #[error("Secure random source failed: {0}")]
    Rng(#[from] rand::Error),
}

impl EntropyError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidWordCount(_) | Self::UserEntropyTooShort(_) => ErrorClass::Input,
            Self::Rng(_) => ErrorClass::Fatal,
        }
    }
}

/// Mixed entropy backing a mnemonic. Locked in memory, wiped on drop.
#[derive(Debug)]
pub struct Entropy {
    buf: LockedBuffer,
}

impl Entropy {
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of whole words this entropy encodes.
    pub fn word_count(&self) -> usize {
        self.len() * 8 / BITS_PER_WORD
    }
}

/// Entropy length in bytes for `word_count` words.
///
/// Rounded up to whole bytes. For counts that are multiples of 8 (such
/// as 24) this is exactly `word_count * 11 / 8`.
pub fn entropy_len(word_count: usize) -> Result<usize, EntropyError> {
    if word_count == 0 || word_count % 3 != 0 {
        return Err(EntropyError::InvalidWordCount(word_count));
    }
    Ok((word_count * BITS_PER_WORD).div_ceil(8))
}

/// Mix OS randomness with `user_entropy` for a `word_count`-word mnemonic.
pub fn mix_entropy(word_count: usize, user_entropy: &str) -> Result<Entropy, EntropyError> {
    mix_entropy_with_rng(&mut OsRng, word_count, user_entropy)
}

/// [`mix_entropy`] with a caller-supplied CSPRNG.
pub fn mix_entropy_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    word_count: usize,
    user_entropy: &str,
) -> Result<Entropy, EntropyError> {
    let len = entropy_len(word_count)?;

    let chars = user_entropy.chars().count();
    if chars < MIN_USER_ENTROPY_CHARS {
        return Err(EntropyError::UserEntropyTooShort(chars));
    }

    let mut buf = LockedBuffer::new(len);
    // A short read would leave predictable zeros, so there is no retry.
    rng.try_fill_bytes(buf.as_mut_slice())?;

    let mut digest = [0u8; 64];
    digest.copy_from_slice(&Sha512::digest(user_entropy.as_bytes()));
    for (i, byte) in buf.as_mut_slice().iter_mut().enumerate() {
        *byte ^= digest[i % digest.len()];
    }
    digest.zeroize();

    log::debug!("mixed {} bytes of entropy for {} words", len, word_count);
    Ok(Entropy { buf })
}
