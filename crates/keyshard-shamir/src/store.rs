//! On-disk share files
//!
//! Share `i` lives in `<dir>/share_<i>` as raw bytes: tag byte then
//! payload, no framing. A set is written all-or-nothing: every share goes
//! to a hidden temporary file first and is renamed into place only once
//! all of them were written and synced.

use crate::shamir::{Share, ShareSet};
use crate::ShamirError;
use keyshard_core::ErrorClass;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zeroize::Zeroizing;

const SHARE_PREFIX: &str = "share_";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Share {index} not found at {}", path.display())]
    MissingShare { index: u8, path: PathBuf },
    #[error("{} already holds share files; refusing to overwrite them", dir.display())]
    ExistingShares { dir: PathBuf },
    #[error("File for share {expected} carries tag {found}")]
    IndexMismatch { expected: u8, found: u8 },
    #[error("Share {index} is unreadable: {source}")]
    Share {
        index: u8,
        #[source]
        source: ShamirError,
    },
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Io { .. } => ErrorClass::Fatal,
            Self::ExistingShares { .. } => ErrorClass::Config,
            Self::MissingShare { .. } | Self::IndexMismatch { .. } | Self::Share { .. } => {
                ErrorClass::Reconstruction
            }
        }
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Directory of share files.
#[derive(Debug, Clone)]
pub struct ShareStore {
    dir: PathBuf,
}

impl ShareStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn share_path(&self, index: u8) -> PathBuf {
        self.dir.join(format!("{}{}", SHARE_PREFIX, index))
    }

    fn temp_path(&self, index: u8) -> PathBuf {
        self.dir.join(format!(".{}{}.tmp", SHARE_PREFIX, index))
    }

    /// Write every share of `set`, or none of them.
    ///
    /// Refuses a directory that already holds share files so that an
    /// earlier backup is never mixed with or replaced by a new one.
    pub fn write_set(&self, set: &ShareSet) -> Result<Vec<PathBuf>, StoreError> {
        create_private_dir(&self.dir).map_err(io_err(&self.dir))?;
        if !self.available()?.is_empty() {
            return Err(StoreError::ExistingShares {
                dir: self.dir.clone(),
            });
        }

        let mut temps = Vec::with_capacity(set.len());
        for share in set.shares() {
            let temp = self.temp_path(share.index());
            // recorded before writing so a partial file is cleaned up too
            temps.push(temp.clone());
            if let Err(e) = write_private(&temp, &Zeroizing::new(share.to_bytes())) {
                self.discard(&temps, &[]);
                return Err(StoreError::Io {
                    path: temp,
                    source: e,
                });
            }
        }

        let mut written = Vec::with_capacity(set.len());
        for (temp, share) in temps.iter().zip(set.shares()) {
            let path = self.share_path(share.index());
            if let Err(e) = fs::rename(temp, &path) {
                self.discard(&temps, &written);
                return Err(StoreError::Io { path, source: e });
            }
            written.push(path);
        }

        log::info!("Wrote {} shares to {}", written.len(), self.dir.display());
        Ok(written)
    }

    /// Best-effort removal after a failed write.
    fn discard(&self, temps: &[PathBuf], written: &[PathBuf]) {
        for path in temps.iter().chain(written) {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("Could not remove {}: {}", path.display(), e),
            }
        }
    }

    pub fn read(&self, index: u8) -> Result<Share, StoreError> {
        let path = self.share_path(index);
        let bytes = match fs::read(&path) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::MissingShare { index, path })
            }
            Err(e) => return Err(StoreError::Io { path, source: e }),
        };

        let share =
            Share::from_bytes(&bytes).map_err(|source| StoreError::Share { index, source })?;
        if share.index() != index {
            return Err(StoreError::IndexMismatch {
                expected: index,
                found: share.index(),
            });
        }
        Ok(share)
    }

    pub fn read_many(&self, indices: &[u8]) -> Result<Vec<Share>, StoreError> {
        indices.iter().map(|&i| self.read(i)).collect()
    }

    /// Sorted indices of the share files present. A missing directory
    /// holds no shares.
    pub fn available(&self) -> Result<Vec<u8>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&self.dir)(e)),
        };

        let mut indices = Vec::new();
        for entry in entries {
            let entry = entry.map_err(io_err(&self.dir))?;
            let name = entry.file_name();
            if let Some(index) = name.to_str().and_then(parse_share_name) {
                indices.push(index);
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }
}

/// `share_<1..=255>`; anything else is not a share file.
fn parse_share_name(name: &str) -> Option<u8> {
    let digits = name.strip_prefix(SHARE_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u8>().ok().filter(|&i| i != 0)
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

fn write_private(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
