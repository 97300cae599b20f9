//! keyshard Shamir Module
//!
//! Split the serialized account secret into N shares so that any T of
//! them rebuild it byte for byte, while fewer than T reveal nothing.
//!
//! Sharing is byte-wise over GF(256): every secret byte is the constant
//! term of its own random polynomial of degree T-1, evaluated at x = 1..=N.
//! A share is its x-coordinate followed by one evaluation per secret
//! byte, `len(secret) + 1` bytes in total.
//!
//! The share format carries no threshold, so reconstruction takes it
//! from the caller and refuses to interpolate from fewer shares.
//!
//! # Example
//!
//! ```
//! use keyshard_shamir::SharingScheme;
//!
//! let scheme = SharingScheme::three_of_five();
//! let set = scheme.split(b"ten bytes!").unwrap();
//!
//! let picked = set.select(&[1, 3, 5]).unwrap();
//! let secret = scheme.combine(&picked).unwrap();
//! assert_eq!(&secret[..], b"ten bytes!");
//! ```

pub mod backup;
pub mod gf256;
pub mod shamir;
pub mod store;

pub use backup::{recover_record, split_record, BackupError};
pub use shamir::{combine_shares, split_secret, Share, ShareSet};
pub use store::{ShareStore, StoreError};

use keyshard_core::ErrorClass;
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Error, Debug)]
pub enum ShamirError {
    #[error("Invalid threshold {threshold} for {total} shares: need 1 <= threshold <= shares")]
    InvalidThreshold { threshold: u8, total: u8 },
    #[error("Share count must be between 1 and 255")]
    InvalidShareCount,
    #[error("Cannot split an empty secret")]
    EmptySecret,
    #[error("Not enough shares to reconstruct: have {have}, need {need}")]
    InsufficientShares { have: usize, need: u8 },
    #[error("Shares have different lengths")]
    LengthMismatch,
    #[error("Share {0} was supplied more than once")]
    DuplicateIndex(u8),
    #[error("Share {index} does not match the others")]
    InconsistentShares { index: u8 },
    #[error("Share {0} is not part of this set")]
    UnknownShare(u8),
    #[error("Invalid share format: {0}")]
    InvalidShare(String),
    #[error("Secure random source failed: {0}")]
    Rng(#[from] rand::Error),
}

impl ShamirError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidThreshold { .. } | Self::InvalidShareCount | Self::EmptySecret => {
                ErrorClass::Config
            }
            Self::Rng(_) => ErrorClass::Fatal,
            _ => ErrorClass::Reconstruction,
        }
    }
}

/// Threshold and share count of a backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharingScheme {
    /// Minimum shares needed to reconstruct (T)
    pub threshold: u8,
    /// Total shares to generate (N)
    pub total_shares: u8,
}

impl SharingScheme {
    pub fn new(threshold: u8, total_shares: u8) -> Result<Self, ShamirError> {
        let scheme = Self {
            threshold,
            total_shares,
        };
        scheme.validate()?;
        Ok(scheme)
    }

    pub fn two_of_three() -> Self {
        Self {
            threshold: 2,
            total_shares: 3,
        }
    }

    pub fn three_of_five() -> Self {
        Self {
            threshold: 3,
            total_shares: 5,
        }
    }

    /// `1 <= threshold <= total_shares <= 255`
    pub fn validate(&self) -> Result<(), ShamirError> {
        if self.total_shares == 0 {
            return Err(ShamirError::InvalidShareCount);
        }
        if self.threshold == 0 || self.threshold > self.total_shares {
            return Err(ShamirError::InvalidThreshold {
                threshold: self.threshold,
                total: self.total_shares,
            });
        }
        Ok(())
    }

    pub fn split(&self, secret: &[u8]) -> Result<ShareSet, ShamirError> {
        split_secret(secret, self.total_shares, self.threshold)
    }

    pub fn combine(&self, shares: &[Share]) -> Result<Zeroizing<Vec<u8>>, ShamirError> {
        combine_shares(shares, self.threshold)
    }
}

impl Default for SharingScheme {
    fn default() -> Self {
        Self::three_of_five()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_validation() {
        assert!(SharingScheme::three_of_five().validate().is_ok());
        assert!(SharingScheme::two_of_three().validate().is_ok());
        assert!(SharingScheme::new(1, 1).is_ok());
        assert!(SharingScheme::new(255, 255).is_ok());

        assert!(matches!(
            SharingScheme::new(0, 3),
            Err(ShamirError::InvalidThreshold { threshold: 0, total: 3 })
        ));
        assert!(matches!(
            SharingScheme::new(4, 3),
            Err(ShamirError::InvalidThreshold { threshold: 4, total: 3 })
        ));
        assert!(matches!(
            SharingScheme::new(0, 0),
            Err(ShamirError::InvalidShareCount)
        ));
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(ShamirError::EmptySecret.class(), ErrorClass::Config);
        assert_eq!(ShamirError::LengthMismatch.class(), ErrorClass::Reconstruction);
        assert_eq!(
            ShamirError::InsufficientShares { have: 1, need: 3 }.class(),
            ErrorClass::Reconstruction
        );
    }

    #[test]
    fn test_scheme_roundtrip() {
        let scheme = SharingScheme::default();
        let set = scheme.split(b"scheme secret").unwrap();
        assert_eq!(set.len(), 5);
        assert_eq!(set.threshold(), 3);

        let secret = scheme.combine(&set.shares()[1..4]).unwrap();
        assert_eq!(&secret[..], b"scheme secret");
    }
}
