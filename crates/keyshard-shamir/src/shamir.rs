//! Shamir split and combine over GF(256)

use crate::gf256::{eval_poly, interpolate};
use crate::ShamirError;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// One share: x-coordinate plus one evaluation per secret byte.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Share {
    index: u8,
    data: Vec<u8>,
}

impl Share {
    pub fn new(index: u8, data: Vec<u8>) -> Result<Self, ShamirError> {
        if index == 0 {
            return Err(ShamirError::InvalidShare("x-coordinate 0 holds the secret".into()));
        }
        if data.is_empty() {
            return Err(ShamirError::InvalidShare("empty share payload".into()));
        }
        Ok(Self { index, data })
    }

    /// x-coordinate, 1..=N
    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Length of the secret this share belongs to.
    pub fn secret_len(&self) -> usize {
        self.data.len()
    }

    /// Raw file form: tag byte then evaluations.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.data.len() + 1);
        bytes.push(self.index);
        bytes.extend_from_slice(&self.data);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ShamirError> {
        match bytes.split_first() {
            Some((&index, data)) if !data.is_empty() => Self::new(index, data.to_vec()),
            _ => Err(ShamirError::InvalidShare(format!(
                "{} bytes is too short for a share",
                bytes.len()
            ))),
        }
    }
}

impl std::fmt::Debug for Share {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Share")
            .field("index", &self.index)
            .field("len", &self.data.len())
            .finish()
    }
}

/// All shares produced by one split.
#[derive(Debug, Clone)]
pub struct ShareSet {
    threshold: u8,
    shares: Vec<Share>,
}

impl ShareSet {
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn get(&self, index: u8) -> Option<&Share> {
        self.shares.iter().find(|s| s.index == index)
    }

    /// Clone the shares with the given x-coordinates, in that order.
    pub fn select(&self, indices: &[u8]) -> Result<Vec<Share>, ShamirError> {
        indices
            .iter()
            .map(|&i| self.get(i).cloned().ok_or(ShamirError::UnknownShare(i)))
            .collect()
    }
}

/// Split `secret` into `total` shares, any `threshold` of which rebuild it.
pub fn split_secret(secret: &[u8], total: u8, threshold: u8) -> Result<ShareSet, ShamirError> {
    split_secret_with_rng(&mut OsRng, secret, total, threshold)
}

/// [`split_secret`] with a caller-supplied CSPRNG.
pub fn split_secret_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    secret: &[u8],
    total: u8,
    threshold: u8,
) -> Result<ShareSet, ShamirError> {
    crate::SharingScheme {
        threshold,
        total_shares: total,
    }
    .validate()?;
    if secret.is_empty() {
        return Err(ShamirError::EmptySecret);
    }

    let mut shares: Vec<Share> = (1..=total)
        .map(|index| Share {
            index,
            data: Vec::with_capacity(secret.len()),
        })
        .collect();

    // p(x) = secret_byte + c1·x + … + c_{t-1}·x^{t-1}
    let mut coefficients = Zeroizing::new(vec![0u8; threshold as usize]);
    for &byte in secret {
        coefficients[0] = byte;
        rng.try_fill_bytes(&mut coefficients[1..])?;

        for share in &mut shares {
            share.data.push(eval_poly(&coefficients, share.index));
        }
    }

    log::debug!(
        "split {} byte secret into {} shares (threshold {})",
        secret.len(),
        total,
        threshold
    );
    Ok(ShareSet { threshold, shares })
}

/// Rebuild the secret from at least `threshold` shares.
///
/// The first `threshold` shares define the polynomials. Any further share
/// must lie on them, otherwise the set is reported inconsistent rather
/// than returning bytes that might be wrong.
pub fn combine_shares(shares: &[Share], threshold: u8) -> Result<Zeroizing<Vec<u8>>, ShamirError> {
    if threshold == 0 {
        return Err(ShamirError::InvalidThreshold {
            threshold,
            total: shares.len().min(u8::MAX as usize) as u8,
        });
    }
    if shares.is_empty() || shares.len() < threshold as usize {
        return Err(ShamirError::InsufficientShares {
            have: shares.len(),
            need: threshold,
        });
    }

    let secret_len = shares[0].data.len();
    if shares.iter().any(|s| s.data.len() != secret_len) {
        return Err(ShamirError::LengthMismatch);
    }

    let mut seen = [false; 256];
    for share in shares {
        if std::mem::replace(&mut seen[share.index as usize], true) {
            return Err(ShamirError::DuplicateIndex(share.index));
        }
    }

    let (basis, extra) = shares.split_at(threshold as usize);
    let xs: Vec<u8> = basis.iter().map(|s| s.index).collect();
    let mut ys = Zeroizing::new(vec![0u8; basis.len()]);
    let mut secret = Zeroizing::new(Vec::with_capacity(secret_len));

    for pos in 0..secret_len {
        for (y, share) in ys.iter_mut().zip(basis) {
            *y = share.data[pos];
        }
        secret.push(interpolate(&xs, &ys, 0));

        for share in extra {
            if interpolate(&xs, &ys, share.index) != share.data[pos] {
                return Err(ShamirError::InconsistentShares { index: share.index });
            }
        }
    }

    log::debug!(
        "combined {} shares into {} byte secret",
        shares.len(),
        secret_len
    );
    Ok(secret)
}
