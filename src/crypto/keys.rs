//! Key material held in memory.
//!
//! Both key types zero their bytes when dropped and never print them.
//! From a master key we derive a dedicated **wrapping key** per key id
//! with HKDF-SHA256 (RFC 5869), so the raw master key is never used to
//! seal anything directly.

use std::fmt;

use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::errors::{CartonError, Result};

/// Length of every symmetric key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// A one-time data key used to encrypt a single secret.
///
/// Lives only for the duration of one encrypt or decrypt call.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DataKey {
    bytes: [u8; KEY_LEN],
}

impl DataKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Build a data key from a slice, rejecting anything that is not
    /// exactly 256 bits.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            CartonError::KeyService(format!(
                "data key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Fill a new data key from the thread-local CSPRNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        let key = Self { bytes };
        bytes.zeroize();
        key
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DataKey([REDACTED])")
    }
}

/// A wrapper around a 32-byte master key that automatically zeroes
/// its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Derive the key that seals data keys for `key_id`.
    ///
    /// `info` is `"eggcarton-wrap:<key_id>"`, so a blob wrapped under one
    /// key id cannot be opened under another even with the same master.
    pub fn derive_wrapping_key(&self, key_id: &str) -> Result<[u8; KEY_LEN]> {
        let info = format!("eggcarton-wrap:{key_id}");
        hkdf_derive(&self.bytes, info.as_bytes())
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

/// Run HKDF-SHA256 expand with the given `info`.
///
/// The master key is already uniformly random, so no salt is used.
fn hkdf_derive(ikm: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| CartonError::KeyService(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}
