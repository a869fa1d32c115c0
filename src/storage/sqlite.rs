//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the `KeyValueStore`
//! trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{BatchPut, KeyValueStore, StorageError, StorageResult};
use crate::storage::Keyspace;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite parameter limit is 999 on older builds; one slot goes to the keyspace
const GET_MANY_CHUNK: usize = 500;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA mmap_size = 268435456;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, keyspace: Keyspace, key: &str) -> StorageResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv WHERE keyspace = ?1 AND key = ?2",
                params![keyspace.as_str(), key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn get_many(&self, keyspace: Keyspace, keys: &[String]) -> StorageResult<Vec<Option<String>>> {
        let conn = self.lock()?;
        let mut found: HashMap<String, String> = HashMap::with_capacity(keys.len());

        for chunk in keys.chunks(GET_MANY_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT key, value FROM kv WHERE keyspace = ? AND key IN ({})",
                placeholders
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let bound = std::iter::once(keyspace.as_str()).chain(chunk.iter().map(String::as_str));
            let rows = stmt.query_map(params_from_iter(bound), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (key, value) = row?;
                found.insert(key, value);
            }
        }

        Ok(keys.iter().map(|key| found.get(key).cloned()).collect())
    }

    fn put(&self, keyspace: Keyspace, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (keyspace, key, value) VALUES (?1, ?2, ?3)",
            params![keyspace.as_str(), key, value],
        )?;
        Ok(())
    }

    fn write_batch(&self, puts: &[BatchPut]) -> StorageResult<()> {
        if puts.is_empty() {
            return Ok(());
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO kv (keyspace, key, value) VALUES (?1, ?2, ?3)",
            )?;
            for put in puts {
                stmt.execute(params![put.keyspace.as_str(), put.key, put.value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn scan(
        &self,
        keyspace: Keyspace,
        after: Option<&str>,
        limit: usize,
    ) -> StorageResult<Vec<(String, String)>> {
        let conn = self.lock()?;
        let limit = limit as i64;

        let entries = match after {
            Some(after) => {
                let mut stmt = conn.prepare_cached(
                    "SELECT key, value FROM kv WHERE keyspace = ?1 AND key > ?2
                     ORDER BY key LIMIT ?3",
                )?;
                let rows = stmt.query_map(params![keyspace.as_str(), after, limit], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare_cached(
                    "SELECT key, value FROM kv WHERE keyspace = ?1 ORDER BY key LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![keyspace.as_str(), limit], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(entries)
    }

    fn count(&self, keyspace: Keyspace) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM kv WHERE keyspace = ?1",
            params![keyspace.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
