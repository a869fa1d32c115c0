//! Typed access to the stargazer graph
//!
//! `GraphStore` encodes statuses, edge lists and derived records as JSON on
//! top of any `KeyValueStore`. Absent keys decode to their empty default.

use crate::state::{NodeKind, NodeStatus};
use crate::storage::traits::{BatchPut, EntryCursor, KeyValueStore, StorageError, StorageResult};
use crate::storage::{CostarsRecord, EdgeMap, Keyspace};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct GraphStore {
    kv: Arc<dyn KeyValueStore>,
}

impl GraphStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Underlying key-value store
    pub fn kv(&self) -> &dyn KeyValueStore {
        self.kv.as_ref()
    }

    // ===== Status =====

    pub fn get_status(&self, id: &str) -> StorageResult<Option<NodeStatus>> {
        self.get_json(Keyspace::Status, id)
    }

    pub fn get_statuses(&self, ids: &[String]) -> StorageResult<Vec<Option<NodeStatus>>> {
        let raw = self.kv.get_many(Keyspace::Status, ids)?;
        ids.iter()
            .zip(raw)
            .map(|(id, value)| match value {
                Some(value) => decode(Keyspace::Status, id, &value).map(Some),
                None => Ok(None),
            })
            .collect()
    }

    pub fn put_status(&self, id: &str, status: &NodeStatus) -> StorageResult<()> {
        self.put_json(Keyspace::Status, id, status)
    }

    /// Writes many statuses in one atomic batch
    pub fn put_statuses(&self, statuses: &[(String, NodeStatus)]) -> StorageResult<()> {
        let puts = statuses
            .iter()
            .map(|(id, status)| {
                Ok(BatchPut {
                    keyspace: Keyspace::Status,
                    key: id.clone(),
                    value: serde_json::to_string(status)?,
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;
        self.kv.write_batch(&puts)
    }

    /// Iterates every status record in key order
    pub fn statuses(&self) -> impl Iterator<Item = StorageResult<(String, NodeStatus)>> + '_ {
        EntryCursor::new(self.kv.as_ref(), Keyspace::Status).map(|entry| {
            let (id, value) = entry?;
            let status = decode(Keyspace::Status, &id, &value)?;
            Ok((id, status))
        })
    }

    /// Writes a discovered status for each identifier that has none yet
    ///
    /// Returns how many records were created.
    pub fn seed(&self, ids: &[String]) -> StorageResult<usize> {
        let existing = self.get_statuses(ids)?;
        let mut fresh: Vec<(String, NodeStatus)> = Vec::new();
        for (id, status) in ids.iter().zip(existing) {
            if status.is_none() && !fresh.iter().any(|(seen, _)| seen == id) {
                fresh.push((id.clone(), NodeStatus::discovered(NodeKind::of_identifier(id))));
            }
        }
        self.put_statuses(&fresh)?;
        Ok(fresh.len())
    }

    /// Clears the error flag (and pull time) on failed nodes
    ///
    /// Restricting to `kind` leaves the other side untouched. Returns the
    /// number of nodes reset.
    pub fn reset_errors(&self, kind: Option<NodeKind>) -> StorageResult<usize> {
        let mut reset = Vec::new();
        for entry in self.statuses() {
            let (id, status) = entry?;
            if status.had_error && kind.map_or(true, |k| k == status.kind) {
                reset.push((id, NodeStatus::discovered(status.kind)));
            }
        }
        self.put_statuses(&reset)?;
        Ok(reset.len())
    }

    // ===== Edges =====

    /// Edge list for `source`; empty when never crawled
    pub fn get_edges(&self, map: EdgeMap, source: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .get_json::<Vec<String>>(map.keyspace(), source)?
            .unwrap_or_default())
    }

    pub fn put_edges(&self, map: EdgeMap, source: &str, targets: &[String]) -> StorageResult<()> {
        self.put_json(map.keyspace(), source, targets)
    }

    /// Last stored target for each source, used as a resume cursor
    pub fn last_targets(&self, map: EdgeMap, sources: &[String]) -> StorageResult<Vec<Option<String>>> {
        let raw = self.kv.get_many(map.keyspace(), sources)?;
        sources
            .iter()
            .zip(raw)
            .map(|(source, value)| match value {
                Some(value) => {
                    let targets: Vec<String> = decode(map.keyspace(), source, &value)?;
                    Ok(targets.last().cloned())
                }
                None => Ok(None),
            })
            .collect()
    }

    // ===== Derived =====

    pub fn get_num_gazers(&self, repo: &str) -> StorageResult<Option<u64>> {
        self.get_json(Keyspace::NumGazers, repo)
    }

    pub fn put_num_gazers(&self, repo: &str, count: u64) -> StorageResult<()> {
        self.put_json(Keyspace::NumGazers, repo, &count)
    }

    pub fn get_costars(&self, repo: &str) -> StorageResult<Option<CostarsRecord>> {
        self.get_json(Keyspace::Costars, repo)
    }

    pub fn put_costars(&self, repo: &str, record: &CostarsRecord) -> StorageResult<()> {
        self.put_json(Keyspace::Costars, repo, record)
    }

    pub fn count(&self, keyspace: Keyspace) -> StorageResult<u64> {
        self.kv.count(keyspace)
    }

    fn get_json<T: DeserializeOwned>(&self, keyspace: Keyspace, key: &str) -> StorageResult<Option<T>> {
        match self.kv.get(keyspace, key)? {
            Some(value) => decode(keyspace, key, &value).map(Some),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize + ?Sized>(&self, keyspace: Keyspace, key: &str, value: &T) -> StorageResult<()> {
        let encoded = serde_json::to_string(value)?;
        self.kv.put(keyspace, key, &encoded)
    }
}

fn decode<T: DeserializeOwned>(keyspace: Keyspace, key: &str, value: &str) -> StorageResult<T> {
    serde_json::from_str(value).map_err(|source| StorageError::Corrupt {
        keyspace: keyspace.as_str(),
        key: key.to_string(),
        source,
    })
}
