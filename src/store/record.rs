//! The persisted unit of the vault.
//!
//! A record is an envelope: the AES-GCM ciphertext of one secret plus
//! the wrapped data key that sealed it.  Byte fields serialize as base64
//! strings in JSON rather than raw byte arrays.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{CartonError, Result};

/// One encrypted secret, addressed by `(owner, secret_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    /// Identity of the owner (partition key).
    pub owner: String,

    /// Name of the secret within the owner's namespace (sort key).
    pub secret_id: String,

    /// nonce || sealed plaintext || tag.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ciphertext: Vec<u8>,

    /// The data key, wrapped by the key service.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub wrapped_data_key: Vec<u8>,

    /// When this version of the secret was written.
    pub created_at: DateTime<Utc>,
}

impl SecretRecord {
    /// Check that the ciphertext travels with its wrapped data key.
    ///
    /// Stores call this before persisting anything.
    pub fn check_envelope(&self) -> Result<()> {
        if self.owner.is_empty() || self.secret_id.is_empty() {
            return Err(CartonError::Store(
                "record is missing its owner or secret id".into(),
            ));
        }
        if self.ciphertext.is_empty() {
            return Err(CartonError::Store(format!(
                "record '{}' has no ciphertext",
                self.secret_id
            )));
        }
        if self.wrapped_data_key.is_empty() {
            return Err(CartonError::Store(format!(
                "record '{}' has no wrapped data key",
                self.secret_id
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data))
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
