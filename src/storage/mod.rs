//! Storage module for persisting the stargazer graph
//!
//! This module handles all persistence for the crawler:
//! - An ordered key-value contract (`KeyValueStore`) over five keyspaces
//! - A SQLite implementation of that contract
//! - Typed access to statuses, edges, and derived records (`GraphStore`)

mod graph;
mod schema;
mod sqlite;
mod traits;

pub use graph::GraphStore;
pub use sqlite::SqliteStore;
pub use traits::{BatchPut, EntryCursor, KeyValueStore, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Opens (or creates) the SQLite-backed graph store at `path`
pub fn open_graph_store(path: &Path) -> StorageResult<GraphStore> {
    let kv = SqliteStore::new(path)?;
    Ok(GraphStore::new(Arc::new(kv)))
}

/// The independent keyspaces sharing one storage engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyspace {
    /// user → starred repos
    Stars,
    /// repo → users who starred it
    Gazers,
    /// node → crawl status
    Status,
    /// repo → authoritative gazer count
    NumGazers,
    /// repo → ranked similar repos
    Costars,
}

impl Keyspace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stars => "stars",
            Self::Gazers => "gazers",
            Self::Status => "status",
            Self::NumGazers => "num_gazers",
            Self::Costars => "costars",
        }
    }

    pub fn all() -> [Keyspace; 5] {
        [
            Self::Stars,
            Self::Gazers,
            Self::Status,
            Self::NumGazers,
            Self::Costars,
        ]
    }
}

/// The two adjacency maps of the bipartite graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeMap {
    Stars,
    Gazers,
}

impl EdgeMap {
    pub fn keyspace(&self) -> Keyspace {
        match self {
            Self::Stars => Keyspace::Stars,
            Self::Gazers => Keyspace::Gazers,
        }
    }
}

/// A single entry of a costars ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Costar {
    pub repo: String,
    pub score: f64,
}

/// Ranked similar repositories for one repo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostarsRecord {
    pub computed_at: DateTime<Utc>,
    pub ranked: Vec<Costar>,
}
