//! Envelope-encryption orchestration and owner checks.
//!
//! `VaultService` ties a `KeyWrapper` and a `SecretStore` together:
//!
//! - **write**: new data key -> encrypt locally -> persist ciphertext with
//!   the wrapped key.  Nothing touches the store until both the wrap and
//!   the encrypt succeeded.
//! - **read**: fetch -> unwrap data key -> decrypt.
//!
//! Every call takes the caller's `Identity`.  Writes always land in the
//! caller's own namespace; reads and deletes of any other namespace fail
//! with `Forbidden`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use zeroize::{Zeroize, Zeroizing};

use super::identity::Identity;
use crate::crypto::{decrypt, encrypt};
use crate::errors::{CartonError, Result};
use crate::kms::{GeneratedDataKey, KeyWrapper};
use crate::store::{SecretRecord, SecretStore};

/// Longest accepted secret id, in bytes.
const MAX_SECRET_ID_LEN: usize = 256;

/// What a successful put reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutReceipt {
    pub owner: String,
    pub secret_id: String,
    pub created_at: DateTime<Utc>,
}

/// A decrypted secret.  The plaintext is wiped when this is dropped.
pub struct RevealedSecret {
    pub owner: String,
    pub secret_id: String,
    pub plaintext: Zeroizing<String>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for RevealedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevealedSecret")
            .field("owner", &self.owner)
            .field("secret_id", &self.secret_id)
            .field("plaintext", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// The vault: a record store plus a key-wrapping client, both injected
/// by whoever owns the process.
pub struct VaultService<S, K> {
    store: S,
    keys: K,
}

impl<S: SecretStore, K: KeyWrapper> VaultService<S, K> {
    pub fn new(store: S, keys: K) -> Self {
        Self { store, keys }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Encrypt `plaintext` under a fresh data key and store it as
    /// `(caller, secret_id)`, replacing any previous value.
    pub fn put_secret(
        &self,
        caller: &Identity,
        secret_id: &str,
        plaintext: &str,
    ) -> Result<PutReceipt> {
        validate_secret_id(secret_id)?;
        if plaintext.is_empty() {
            return Err(CartonError::Validation(
                "secret value cannot be empty".into(),
            ));
        }

        // The owner comes from the authenticated identity, never the request.
        let owner = caller.as_str().to_string();

        let GeneratedDataKey {
            plaintext: data_key,
            wrapped,
        } = self.keys.generate_data_key()?;

        let ciphertext = encrypt(data_key.as_bytes(), plaintext.as_bytes());
        drop(data_key);
        let ciphertext = ciphertext?;

        let record = SecretRecord {
            owner,
            secret_id: secret_id.to_string(),
            ciphertext,
            wrapped_data_key: wrapped,
            created_at: Utc::now(),
        };
        self.store.put(&record)?;

        info!(
            owner = %record.owner,
            secret_id = %record.secret_id,
            key_id = self.keys.key_id(),
            "stored secret"
        );

        Ok(PutReceipt {
            owner: record.owner,
            secret_id: record.secret_id,
            created_at: record.created_at,
        })
    }

    /// Decrypt one of `owner`'s secrets.
    pub fn get_secret(
        &self,
        caller: &Identity,
        owner: &str,
        secret_id: &str,
    ) -> Result<RevealedSecret> {
        caller.authorize(owner)?;
        let record = self.store.get(owner, secret_id)?;
        debug!(owner, secret_id, "read secret");
        self.reveal(record)
    }

    /// Decrypt every secret `owner` has, sorted by secret id.
    ///
    /// A record that fails to unwrap or decrypt is logged and left out;
    /// it does not cost the caller the rest of their secrets.
    pub fn get_all_secrets(&self, caller: &Identity, owner: &str) -> Result<Vec<RevealedSecret>> {
        caller.authorize(owner)?;
        let records = self.store.get_all(owner)?;

        let total = records.len();
        let mut revealed = Vec::with_capacity(total);
        for record in records {
            let secret_id = record.secret_id.clone();
            match self.reveal(record) {
                Ok(secret) => revealed.push(secret),
                Err(e) => warn!(
                    owner,
                    secret_id = %secret_id,
                    kind = ?e.kind(),
                    error = %e,
                    "skipping secret that could not be decrypted"
                ),
            }
        }

        revealed.sort_by(|a, b| a.secret_id.cmp(&b.secret_id));
        debug!(owner, total, returned = revealed.len(), "read all secrets");
        Ok(revealed)
    }

    /// Permanently remove one of `owner`'s secrets.
    pub fn delete_secret(&self, caller: &Identity, owner: &str, secret_id: &str) -> Result<()> {
        caller.authorize(owner)?;
        self.store.delete(owner, secret_id)?;
        info!(owner, secret_id, "deleted secret");
        Ok(())
    }

    /// Return the stored envelope for one of `owner`'s secrets without
    /// decrypting it.
    pub fn inspect_secret(
        &self,
        caller: &Identity,
        owner: &str,
        secret_id: &str,
    ) -> Result<SecretRecord> {
        caller.authorize(owner)?;
        self.store.get(owner, secret_id)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn reveal(&self, record: SecretRecord) -> Result<RevealedSecret> {
        let data_key = self.keys.unwrap_data_key(&record.wrapped_data_key)?;
        let bytes = decrypt(data_key.as_bytes(), &record.ciphertext)?;
        drop(data_key);

        // On error, zeroize the bytes inside the error before discarding.
        let plaintext = String::from_utf8(bytes).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            CartonError::SerializationError("secret value is not valid UTF-8".into())
        })?;

        Ok(RevealedSecret {
            owner: record.owner,
            secret_id: record.secret_id,
            plaintext: Zeroizing::new(plaintext),
            created_at: record.created_at,
        })
    }
}

/// Secret ids must be non-empty, at most 256 bytes, and free of
/// control characters.
fn validate_secret_id(secret_id: &str) -> Result<()> {
    if secret_id.is_empty() {
        return Err(CartonError::Validation("secret id cannot be empty".into()));
    }
    if secret_id.len() > MAX_SECRET_ID_LEN {
        return Err(CartonError::Validation(format!(
            "secret id cannot exceed {MAX_SECRET_ID_LEN} bytes"
        )));
    }
    if secret_id.chars().any(char::is_control) {
        return Err(CartonError::Validation(
            "secret id cannot contain control characters".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::DataKey;
    use crate::kms::LocalKms;
    use crate::store::MemoryStore;

    fn service() -> VaultService<MemoryStore, LocalKms> {
        VaultService::new(MemoryStore::new(), LocalKms::generate("test/key").unwrap())
    }

    fn id(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    /// Key service that is always down.
    struct UnavailableKms;

    impl KeyWrapper for UnavailableKms {
        fn key_id(&self) -> &str {
            "down"
        }

        fn generate_data_key(&self) -> Result<GeneratedDataKey> {
            Err(CartonError::KeyService("service unavailable".into()))
        }

        fn unwrap_data_key(&self, _wrapped: &[u8]) -> Result<DataKey> {
            Err(CartonError::KeyService("service unavailable".into()))
        }
    }

    #[test]
    fn put_then_get_roundtrip() {
        let vault = service();
        let u1 = id("u1");
        let receipt = vault.put_secret(&u1, "S1", "sk-abc123").unwrap();
        assert_eq!(receipt.owner, "u1");
        assert_eq!(receipt.secret_id, "S1");

        let secret = vault.get_secret(&u1, "u1", "S1").unwrap();
        assert_eq!(secret.plaintext.as_str(), "sk-abc123");
        assert_eq!(secret.created_at, receipt.created_at);
    }

    #[test]
    fn put_validates_input() {
        let vault = service();
        let u1 = id("u1");
        assert!(matches!(
            vault.put_secret(&u1, "", "value"),
            Err(CartonError::Validation(_))
        ));
        assert!(matches!(
            vault.put_secret(&u1, "S1", ""),
            Err(CartonError::Validation(_))
        ));
        assert!(vault.put_secret(&u1, &"x".repeat(257), "v").is_err());
        assert!(vault.put_secret(&u1, "bad\nid", "v").is_err());
        assert!(vault.store().is_empty());
    }

    #[test]
    fn put_always_writes_into_callers_namespace() {
        let vault = service();
        vault.put_secret(&id("alice"), "S1", "v").unwrap();
        assert!(vault.store().get("alice", "S1").is_ok());
        assert_eq!(vault.store().len(), 1);
    }

    #[test]
    fn reads_and_deletes_of_other_owners_are_forbidden() {
        let vault = service();
        vault.put_secret(&id("bob"), "S1", "v").unwrap();
        let alice = id("alice");

        assert!(matches!(
            vault.get_secret(&alice, "bob", "S1"),
            Err(CartonError::Forbidden)
        ));
        assert!(matches!(
            vault.get_all_secrets(&alice, "bob"),
            Err(CartonError::Forbidden)
        ));
        assert!(matches!(
            vault.delete_secret(&alice, "bob", "S1"),
            Err(CartonError::Forbidden)
        ));
        assert!(matches!(
            vault.inspect_secret(&alice, "bob", "S1"),
            Err(CartonError::Forbidden)
        ));
        assert!(vault.store().get("bob", "S1").is_ok());
    }

    #[test]
    fn forbidden_wins_over_not_found() {
        let vault = service();
        assert!(matches!(
            vault.get_secret(&id("alice"), "bob", "missing"),
            Err(CartonError::Forbidden)
        ));
    }

    #[test]
    fn overwrite_returns_latest_value() {
        let vault = service();
        let u1 = id("u1");
        vault.put_secret(&u1, "X", "v1").unwrap();
        vault.put_secret(&u1, "X", "v2").unwrap();
        assert_eq!(vault.get_secret(&u1, "u1", "X").unwrap().plaintext.as_str(), "v2");
        assert_eq!(vault.get_all_secrets(&u1, "u1").unwrap().len(), 1);
    }

    #[test]
    fn each_put_uses_a_fresh_data_key() {
        let vault = service();
        let u1 = id("u1");
        vault.put_secret(&u1, "A", "same").unwrap();
        vault.put_secret(&u1, "B", "same").unwrap();
        let a = vault.store().get("u1", "A").unwrap();
        let b = vault.store().get("u1", "B").unwrap();
        assert_ne!(a.wrapped_data_key, b.wrapped_data_key);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn missing_secret_is_not_found() {
        let vault = service();
        let u1 = id("u1");
        assert!(matches!(
            vault.get_secret(&u1, "u1", "nope"),
            Err(CartonError::SecretNotFound(_))
        ));
        assert!(matches!(
            vault.delete_secret(&u1, "u1", "nope"),
            Err(CartonError::SecretNotFound(_))
        ));
    }

    #[test]
    fn get_all_skips_corrupted_record() {
        let vault = service();
        let u1 = id("u1");
        vault.put_secret(&u1, "good", "fine").unwrap();
        vault.put_secret(&u1, "bad", "broken").unwrap();

        let mut record = vault.store().get("u1", "bad").unwrap();
        let last = record.wrapped_data_key.len() - 1;
        record.wrapped_data_key[last] ^= 0xFF;
        vault.store().put(&record).unwrap();

        let secrets = vault.get_all_secrets(&u1, "u1").unwrap();
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets[0].secret_id, "good");
        assert_eq!(secrets[0].plaintext.as_str(), "fine");

        assert!(matches!(
            vault.get_secret(&u1, "u1", "bad"),
            Err(CartonError::KeyService(_))
        ));
    }

    #[test]
    fn get_all_skips_tampered_ciphertext() {
        let vault = service();
        let u1 = id("u1");
        vault.put_secret(&u1, "a", "one").unwrap();
        vault.put_secret(&u1, "b", "two").unwrap();

        let mut record = vault.store().get("u1", "a").unwrap();
        record.ciphertext[14] ^= 0x01;
        vault.store().put(&record).unwrap();

        let secrets = vault.get_all_secrets(&u1, "u1").unwrap();
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets[0].secret_id, "b");
        assert!(matches!(
            vault.get_secret(&u1, "u1", "a"),
            Err(CartonError::DecryptionFailed)
        ));
    }

    #[test]
    fn get_all_is_sorted_and_empty_for_new_owner() {
        let vault = service();
        let u1 = id("u1");
        assert!(vault.get_all_secrets(&u1, "u1").unwrap().is_empty());

        for name in ["zeta", "alpha", "mid"] {
            vault.put_secret(&u1, name, "v").unwrap();
        }
        let ids: Vec<String> = vault
            .get_all_secrets(&u1, "u1")
            .unwrap()
            .into_iter()
            .map(|s| s.secret_id.clone())
            .collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn key_service_failure_writes_nothing() {
        let vault = VaultService::new(MemoryStore::new(), UnavailableKms);
        let err = vault.put_secret(&id("u1"), "S1", "v").unwrap_err();
        assert!(matches!(err, CartonError::KeyService(_)));
        assert!(err.is_retryable());
        assert!(vault.store().is_empty());
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let vault = service();
        let u1 = id("u1");
        vault.put_secret(&u1, "S1", "v").unwrap();
        vault.delete_secret(&u1, "u1", "S1").unwrap();
        assert!(matches!(
            vault.get_secret(&u1, "u1", "S1"),
            Err(CartonError::SecretNotFound(_))
        ));
    }
}
