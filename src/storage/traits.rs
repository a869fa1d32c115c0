//! Storage traits and error types
//!
//! This module defines the ordered key-value contract shared by every
//! keyspace, plus a paging cursor over it.

use crate::storage::Keyspace;
use std::collections::VecDeque;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt value in {keyspace} for {key}: {source}")]
    Corrupt {
        keyspace: &'static str,
        key: String,
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// One put inside an atomic batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPut {
    pub keyspace: Keyspace,
    pub key: String,
    pub value: String,
}

/// Ordered key-value store
///
/// Keys iterate in byte order within a keyspace. Values are opaque strings;
/// typed encoding lives in `GraphStore`. Implementations must be safe to call
/// from concurrent crawl workers. Writes are durable per key; only
/// `write_batch` is atomic across keys.
pub trait KeyValueStore: Send + Sync {
    /// Gets one value; `None` when the key is absent
    fn get(&self, keyspace: Keyspace, key: &str) -> StorageResult<Option<String>>;

    /// Gets many values in one lookup, preserving the order of `keys`
    fn get_many(&self, keyspace: Keyspace, keys: &[String]) -> StorageResult<Vec<Option<String>>>;

    /// Inserts or replaces one value
    fn put(&self, keyspace: Keyspace, key: &str, value: &str) -> StorageResult<()>;

    /// Applies all puts atomically
    fn write_batch(&self, puts: &[BatchPut]) -> StorageResult<()>;

    /// Returns up to `limit` entries with keys strictly after `after`
    fn scan(
        &self,
        keyspace: Keyspace,
        after: Option<&str>,
        limit: usize,
    ) -> StorageResult<Vec<(String, String)>>;

    /// Counts the keys in a keyspace
    fn count(&self, keyspace: Keyspace) -> StorageResult<u64>;
}

/// Streaming cursor over a keyspace in key order
///
/// Fetches `page_size` entries at a time, so a full scan never holds the
/// keyspace in memory. Yields an error once and then stops.
pub struct EntryCursor<'a> {
    store: &'a dyn KeyValueStore,
    keyspace: Keyspace,
    page_size: usize,
    buffer: VecDeque<(String, String)>,
    last_key: Option<String>,
    exhausted: bool,
}

impl<'a> EntryCursor<'a> {
    pub const DEFAULT_PAGE_SIZE: usize = 1000;

    pub fn new(store: &'a dyn KeyValueStore, keyspace: Keyspace) -> Self {
        Self::with_page_size(store, keyspace, Self::DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(store: &'a dyn KeyValueStore, keyspace: Keyspace, page_size: usize) -> Self {
        Self {
            store,
            keyspace,
            page_size: page_size.max(1),
            buffer: VecDeque::new(),
            last_key: None,
            exhausted: false,
        }
    }

    /// Adapts the cursor to yield keys only
    pub fn keys(self) -> impl Iterator<Item = StorageResult<String>> + 'a {
        self.map(|entry| entry.map(|(key, _)| key))
    }

    fn refill(&mut self) -> StorageResult<()> {
        let page = self
            .store
            .scan(self.keyspace, self.last_key.as_deref(), self.page_size)?;
        if page.len() < self.page_size {
            self.exhausted = true;
        }
        if let Some((key, _)) = page.last() {
            self.last_key = Some(key.clone());
        }
        self.buffer.extend(page);
        Ok(())
    }
}

impl Iterator for EntryCursor<'_> {
    type Item = StorageResult<(String, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.refill() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
