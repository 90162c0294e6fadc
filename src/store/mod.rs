//! Secret record store.
//!
//! This module provides:
//! - The `SecretRecord` envelope type (`record`)
//! - An in-process map-backed store (`memory`)
//! - A durable SQLite-backed store (`sqlite`)
//!
//! Any keyed backend works as long as it honours the `SecretStore`
//! contract below.

pub mod memory;
pub mod record;
pub mod sqlite;

pub use memory::MemoryStore;
pub use record::SecretRecord;
pub use sqlite::SqliteStore;

use crate::errors::Result;

/// Keyed storage for secret records under `(owner, secret_id)`.
pub trait SecretStore {
    /// Insert or replace the record at its composite key (last write wins).
    fn put(&self, record: &SecretRecord) -> Result<()>;

    /// Fetch one record, or `SecretNotFound`.
    fn get(&self, owner: &str, secret_id: &str) -> Result<SecretRecord>;

    /// Fetch every record belonging to `owner`.  Empty when there are none.
    fn get_all(&self, owner: &str) -> Result<Vec<SecretRecord>>;

    /// Remove one record, or `SecretNotFound` if it was not there.
    fn delete(&self, owner: &str, secret_id: &str) -> Result<()>;
}

impl<T: SecretStore + ?Sized> SecretStore for &T {
    fn put(&self, record: &SecretRecord) -> Result<()> {
        (**self).put(record)
    }

    fn get(&self, owner: &str, secret_id: &str) -> Result<SecretRecord> {
        (**self).get(owner, secret_id)
    }

    fn get_all(&self, owner: &str) -> Result<Vec<SecretRecord>> {
        (**self).get_all(owner)
    }

    fn delete(&self, owner: &str, secret_id: &str) -> Result<()> {
        (**self).delete(owner, secret_id)
    }
}
