//! In-process record store.
//!
//! Useful for tests and for embedding the vault where durability is
//! handled elsewhere.  Records are cloned in and out so callers never
//! share mutable state with the map.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{SecretRecord, SecretStore};
use crate::errors::{CartonError, Result};

type CompositeKey = (String, String);

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<CompositeKey, SecretRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all owners.
    pub fn len(&self) -> usize {
        self.records.read().map_or(0, |map| map.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> CartonError {
    CartonError::Store("memory store lock poisoned".into())
}

impl SecretStore for MemoryStore {
    fn put(&self, record: &SecretRecord) -> Result<()> {
        record.check_envelope()?;
        let mut map = self.records.write().map_err(poisoned)?;
        map.insert(
            (record.owner.clone(), record.secret_id.clone()),
            record.clone(),
        );
        Ok(())
    }

    fn get(&self, owner: &str, secret_id: &str) -> Result<SecretRecord> {
        let map = self.records.read().map_err(poisoned)?;
        map.get(&(owner.to_string(), secret_id.to_string()))
            .cloned()
            .ok_or_else(|| CartonError::SecretNotFound(secret_id.to_string()))
    }

    fn get_all(&self, owner: &str) -> Result<Vec<SecretRecord>> {
        let map = self.records.read().map_err(poisoned)?;
        Ok(map
            .iter()
            .filter(|((o, _), _)| o == owner)
            .map(|(_, record)| record.clone())
            .collect())
    }

    fn delete(&self, owner: &str, secret_id: &str) -> Result<()> {
        let mut map = self.records.write().map_err(poisoned)?;
        match map.remove(&(owner.to_string(), secret_id.to_string())) {
            Some(_) => Ok(()),
            None => Err(CartonError::SecretNotFound(secret_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;

    #[test]
    fn put_then_get() {
        contract::put_then_get(&MemoryStore::new());
    }

    #[test]
    fn put_overwrites() {
        contract::put_overwrites(&MemoryStore::new());
    }

    #[test]
    fn get_missing_is_not_found() {
        contract::get_missing_is_not_found(&MemoryStore::new());
    }

    #[test]
    fn get_all_is_owner_scoped() {
        contract::get_all_is_owner_scoped(&MemoryStore::new());
    }

    #[test]
    fn delete_removes_and_reports_absence() {
        contract::delete_removes_and_reports_absence(&MemoryStore::new());
    }

    #[test]
    fn rejects_half_envelopes() {
        let store = MemoryStore::new();
        contract::rejects_half_envelopes(&store);
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_writers_on_distinct_keys() {
        let store = MemoryStore::new();
        std::thread::scope(|s| {
            for i in 0..8u8 {
                let store = &store;
                s.spawn(move || {
                    store
                        .put(&contract::record("u1", &format!("S{i}"), i))
                        .unwrap();
                });
            }
        });
        assert_eq!(store.len(), 8);
    }
}
