//! Sharing of a [`SensitiveRecord`]

use crate::shamir::{combine_shares, Share, ShareSet};
use crate::{ShamirError, SharingScheme};
use keyshard_core::{ErrorClass, RecordError, SensitiveRecord};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error(transparent)]
    Shamir(#[from] ShamirError),
    #[error(transparent)]
    Record(#[from] RecordError),
}

impl BackupError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Shamir(e) => e.class(),
            Self::Record(e) => e.class(),
        }
    }
}

/// Split the serialized record under `scheme`.
pub fn split_record(
    record: &SensitiveRecord,
    scheme: &SharingScheme,
) -> Result<ShareSet, BackupError> {
    let bytes = record.to_bytes()?;
    Ok(scheme.split(&bytes)?)
}

/// Combine shares and parse the result back into a record.
pub fn recover_record(shares: &[Share], threshold: u8) -> Result<SensitiveRecord, BackupError> {
    let bytes = combine_shares(shares, threshold)?;
    Ok(SensitiveRecord::from_bytes(&bytes)?)
}
