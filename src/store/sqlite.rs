//! SQLite-backed record store.
//!
//! One table keyed by `(owner, secret_id)`.  Writes are upserts, bulk
//! reads are owner-scoped `SELECT`s, and deletes report absence through
//! the affected-row count.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, warn};

use super::{SecretRecord, SecretStore};
use crate::errors::{CartonError, Result};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS secrets (
    owner            TEXT NOT NULL,
    secret_id        TEXT NOT NULL,
    ciphertext       BLOB NOT NULL,
    wrapped_data_key BLOB NOT NULL,
    created_at       TEXT NOT NULL,
    PRIMARY KEY (owner, secret_id)
);";

/// Durable store backed by a single SQLite database file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| CartonError::Store(format!("open {}: {e}", path.display())))?;

        let store = Self::with_connection(conn)?;

        // Restrict the database to its owner.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        debug!(path = %path.display(), "opened secret store");
        Ok(store)
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CartonError::Store(format!("open in-memory: {e}")))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| CartonError::Store(format!("create schema: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CartonError::Store("sqlite connection lock poisoned".into()))
    }
}

/// Map one `secrets` row onto a record.  The timestamp is returned raw
/// so parse failures can be reported as store errors.
fn read_row(row: &Row<'_>) -> rusqlite::Result<(SecretRecord, String)> {
    let created_at: String = row.get(4)?;
    Ok((
        SecretRecord {
            owner: row.get(0)?,
            secret_id: row.get(1)?,
            ciphertext: row.get(2)?,
            wrapped_data_key: row.get(3)?,
            created_at: DateTime::<Utc>::MIN_UTC,
        },
        created_at,
    ))
}

fn finish_row((mut record, created_at): (SecretRecord, String)) -> Result<SecretRecord> {
    record.created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            CartonError::Store(format!(
                "record '{}' has a bad timestamp: {e}",
                record.secret_id
            ))
        })?;
    Ok(record)
}

impl SecretStore for SqliteStore {
    fn put(&self, record: &SecretRecord) -> Result<()> {
        record.check_envelope()?;
        let created_at = record
            .created_at
            .to_rfc3339_opts(SecondsFormat::AutoSi, true);

        self.conn()?
            .execute(
                "INSERT INTO secrets (owner, secret_id, ciphertext, wrapped_data_key, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (owner, secret_id) DO UPDATE SET
                     ciphertext       = excluded.ciphertext,
                     wrapped_data_key = excluded.wrapped_data_key,
                     created_at       = excluded.created_at",
                params![
                    record.owner,
                    record.secret_id,
                    record.ciphertext,
                    record.wrapped_data_key,
                    created_at
                ],
            )
            .map_err(|e| CartonError::Store(format!("put '{}': {e}", record.secret_id)))?;
        Ok(())
    }

    fn get(&self, owner: &str, secret_id: &str) -> Result<SecretRecord> {
        let row = self
            .conn()?
            .query_row(
                "SELECT owner, secret_id, ciphertext, wrapped_data_key, created_at
                 FROM secrets
                 WHERE owner = ?1 AND secret_id = ?2",
                params![owner, secret_id],
                read_row,
            )
            .optional()
            .map_err(|e| CartonError::Store(format!("get '{secret_id}': {e}")))?;

        match row {
            Some(row) => finish_row(row),
            None => Err(CartonError::SecretNotFound(secret_id.to_string())),
        }
    }

    fn get_all(&self, owner: &str) -> Result<Vec<SecretRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT owner, secret_id, ciphertext, wrapped_data_key, created_at
                 FROM secrets
                 WHERE owner = ?1",
            )
            .map_err(|e| CartonError::Store(format!("query prepare: {e}")))?;

        let rows = stmt
            .query_map(params![owner], read_row)
            .map_err(|e| CartonError::Store(format!("query exec: {e}")))?;

        // A row with an unreadable timestamp is left out rather than
        // hiding the owner's other records.
        let mut records = Vec::new();
        for row in rows {
            let row = row.map_err(|e| CartonError::Store(format!("row parse: {e}")))?;
            match finish_row(row) {
                Ok(record) => records.push(record),
                Err(e) => warn!(owner, error = %e, "skipping unreadable record"),
            }
        }
        Ok(records)
    }

    fn delete(&self, owner: &str, secret_id: &str) -> Result<()> {
        let affected = self
            .conn()?
            .execute(
                "DELETE FROM secrets WHERE owner = ?1 AND secret_id = ?2",
                params![owner, secret_id],
            )
            .map_err(|e| CartonError::Store(format!("delete '{secret_id}': {e}")))?;

        if affected == 0 {
            return Err(CartonError::SecretNotFound(secret_id.to_string()));
        }
        Ok(())
    }
}
