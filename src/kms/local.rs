//! Local key-wrapping backend.
//!
//! Stands in for a managed KMS: a 32-byte master key lives in a keyfile
//! next to the database, and data keys are sealed with AES-256-GCM under
//! a wrapping key derived from that master key and the key id.
//!
//! Wrapped blob layout:
//!
//! ```text
//! [version: 1 byte][key_id_len: 1 byte][key_id][12-byte nonce | sealed data key + 16-byte tag]
//! ```

use std::fs;
use std::path::Path;

use rand::RngCore;
use tracing::debug;
use zeroize::Zeroize;

use super::{GeneratedDataKey, KeyWrapper, DATA_KEY_SPEC};
use crate::crypto::{decrypt, encrypt, DataKey, MasterKey, KEY_LEN};
use crate::errors::{CartonError, Result};

/// Current wrapped-blob format version.
const WRAP_VERSION: u8 = 1;

/// Fixed-size prefix: 1 (version) + 1 (key_id_len).
const PREFIX_LEN: usize = 2;

/// Longest key id that fits the one-byte length prefix.
const MAX_KEY_ID_LEN: usize = u8::MAX as usize;

/// Key-wrapping client backed by a local master key.
#[derive(Debug)]
pub struct LocalKms {
    key_id: String,
    master: MasterKey,
}

impl LocalKms {
    /// Build a client around an existing master key.
    pub fn new(key_id: &str, master: MasterKey) -> Result<Self> {
        validate_key_id(key_id)?;
        Ok(Self {
            key_id: key_id.to_string(),
            master,
        })
    }

    /// Build a client around a random, in-memory master key.
    pub fn generate(key_id: &str) -> Result<Self> {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        let master = MasterKey::new(bytes);
        bytes.zeroize();
        Self::new(key_id, master)
    }

    /// Load the master key from a keyfile written by `create_keyfile`.
    pub fn from_keyfile(key_id: &str, path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CartonError::KeyService(format!(
                "master keyfile not found at {}",
                path.display()
            )));
        }

        let mut data = fs::read(path)
            .map_err(|e| CartonError::KeyService(format!("failed to read keyfile: {e}")))?;

        let bytes: std::result::Result<[u8; KEY_LEN], _> = data.as_slice().try_into();
        let len = data.len();
        data.zeroize();
        let mut bytes = bytes.map_err(|_| {
            CartonError::KeyService(format!(
                "master keyfile must be exactly {KEY_LEN} bytes, got {len}"
            ))
        })?;

        let master = MasterKey::new(bytes);
        bytes.zeroize();
        Self::new(key_id, master)
    }

    /// Generate a new random master keyfile at `path`.
    ///
    /// Refuses to overwrite an existing file.  On Unix the file is
    /// restricted to owner read/write.
    pub fn create_keyfile(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(CartonError::KeyService(format!(
                "master keyfile already exists at {}",
                path.display()
            )));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    CartonError::KeyService(format!("cannot create keyfile directory: {e}"))
                })?;
            }
        }

        let mut keyfile = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut keyfile);
        let written = fs::write(path, keyfile);
        keyfile.zeroize();
        written.map_err(|e| CartonError::KeyService(format!("failed to write keyfile: {e}")))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms).map_err(|e| {
                CartonError::KeyService(format!("failed to set keyfile permissions: {e}"))
            })?;
        }

        Ok(())
    }

    fn wrap(&self, data_key: &DataKey) -> Result<Vec<u8>> {
        let mut wrapping_key = self.master.derive_wrapping_key(&self.key_id)?;
        let sealed = encrypt(&wrapping_key, data_key.as_bytes());
        wrapping_key.zeroize();
        let sealed =
            sealed.map_err(|e| CartonError::KeyService(format!("failed to wrap data key: {e}")))?;

        let id = self.key_id.as_bytes();
        let mut blob = Vec::with_capacity(PREFIX_LEN + id.len() + sealed.len());
        blob.push(WRAP_VERSION);
        // validate_key_id guarantees the length fits in a byte.
        blob.push(id.len() as u8);
        blob.extend_from_slice(id);
        blob.extend_from_slice(&sealed);
        Ok(blob)
    }
}

impl KeyWrapper for LocalKms {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn generate_data_key(&self) -> Result<GeneratedDataKey> {
        let plaintext = DataKey::random();
        let wrapped = self.wrap(&plaintext)?;
        debug!(key_id = %self.key_id, spec = DATA_KEY_SPEC, "generated data key");
        Ok(GeneratedDataKey { plaintext, wrapped })
    }

    fn unwrap_data_key(&self, wrapped: &[u8]) -> Result<DataKey> {
        if wrapped.len() < PREFIX_LEN {
            return Err(CartonError::KeyService("wrapped data key is truncated".into()));
        }

        if wrapped[0] != WRAP_VERSION {
            return Err(CartonError::KeyService(format!(
                "unsupported wrapped key version {}",
                wrapped[0]
            )));
        }

        let id_len = usize::from(wrapped[1]);
        let id_end = PREFIX_LEN + id_len;
        if wrapped.len() < id_end {
            return Err(CartonError::KeyService("wrapped data key is truncated".into()));
        }

        if &wrapped[PREFIX_LEN..id_end] != self.key_id.as_bytes() {
            return Err(CartonError::KeyService(
                "wrapped data key belongs to a different master key".into(),
            ));
        }

        let mut wrapping_key = self.master.derive_wrapping_key(&self.key_id)?;
        let opened = decrypt(&wrapping_key, &wrapped[id_end..]);
        wrapping_key.zeroize();

        let mut raw = opened.map_err(|_| {
            CartonError::KeyService("wrapped data key is invalid or was tampered with".into())
        })?;
        let key = DataKey::from_slice(&raw);
        raw.zeroize();
        key
    }
}

fn validate_key_id(key_id: &str) -> Result<()> {
    if key_id.is_empty() {
        return Err(CartonError::ConfigError("key id cannot be empty".into()));
    }
    if key_id.len() > MAX_KEY_ID_LEN {
        return Err(CartonError::ConfigError(format!(
            "key id cannot exceed {MAX_KEY_ID_LEN} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn generate_then_unwrap_returns_same_key() {
        let kms = LocalKms::generate("test/key").unwrap();
        let generated = kms.generate_data_key().unwrap();
        let unwrapped = kms.unwrap_data_key(&generated.wrapped).unwrap();
        assert_eq!(unwrapped.as_bytes(), generated.plaintext.as_bytes());
    }

    #[test]
    fn wrapped_key_does_not_contain_plaintext_key() {
        let kms = LocalKms::generate("test/key").unwrap();
        let generated = kms.generate_data_key().unwrap();
        let raw = generated.plaintext.as_bytes();
        assert!(!generated.wrapped.windows(KEY_LEN).any(|w| w == raw));
    }

    #[test]
    fn tampered_blob_is_rejected() {
        let kms = LocalKms::generate("test/key").unwrap();
        let mut wrapped = kms.generate_data_key().unwrap().wrapped;
        let last = wrapped.len() - 1;
        wrapped[last] ^= 0x01;
        assert!(matches!(
            kms.unwrap_data_key(&wrapped),
            Err(CartonError::KeyService(_))
        ));
    }

    #[test]
    fn other_master_key_cannot_unwrap() {
        let a = LocalKms::generate("shared-id").unwrap();
        let b = LocalKms::generate("shared-id").unwrap();
        let wrapped = a.generate_data_key().unwrap().wrapped;
        assert!(b.unwrap_data_key(&wrapped).is_err());
    }

    #[test]
    fn other_key_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("master.key");
        LocalKms::create_keyfile(&path).unwrap();

        let a = LocalKms::from_keyfile("alpha", &path).unwrap();
        let b = LocalKms::from_keyfile("beta", &path).unwrap();
        let wrapped = a.generate_data_key().unwrap().wrapped;

        let err = b.unwrap_data_key(&wrapped).unwrap_err();
        assert!(err.to_string().contains("different master key"));
    }

    #[test]
    fn truncated_and_unknown_version_blobs_fail() {
        let kms = LocalKms::generate("k").unwrap();
        assert!(kms.unwrap_data_key(&[]).is_err());
        assert!(kms.unwrap_data_key(&[WRAP_VERSION, 40, b'k']).is_err());

        let mut wrapped = kms.generate_data_key().unwrap().wrapped;
        wrapped[0] = 9;
        assert!(kms.unwrap_data_key(&wrapped).is_err());
    }

    #[test]
    fn keyfile_roundtrip_preserves_master_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys").join("master.key");
        LocalKms::create_keyfile(&path).unwrap();

        let first = LocalKms::from_keyfile("k", &path).unwrap();
        let wrapped = first.generate_data_key().unwrap().wrapped;

        let reopened = LocalKms::from_keyfile("k", &path).unwrap();
        assert!(reopened.unwrap_data_key(&wrapped).is_ok());
    }

    #[test]
    fn create_keyfile_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("master.key");
        LocalKms::create_keyfile(&path).unwrap();
        assert!(LocalKms::create_keyfile(&path).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn keyfile_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("master.key");
        LocalKms::create_keyfile(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn wrong_length_keyfile_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.key");
        fs::write(&path, [0u8; 16]).unwrap();
        assert!(LocalKms::from_keyfile("k", &path).is_err());
    }

    #[test]
    fn missing_keyfile_is_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(LocalKms::from_keyfile("k", &dir.path().join("nope.key")).is_err());
    }

    #[test]
    fn key_id_bounds_are_enforced() {
        assert!(LocalKms::generate("").is_err());
        assert!(LocalKms::generate(&"x".repeat(256)).is_err());
        assert!(LocalKms::generate(&"x".repeat(255)).is_ok());
    }
}
