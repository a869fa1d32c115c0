//! Crawler module for the stargazer graph
//!
//! This module contains the core crawling logic, including:
//! - Frontier selection from the status store
//! - Partitioning a frontier across parallel workers
//! - Driving the external target fetcher per chunk
//! - Merging fetched edges and discovering new nodes
//! - The round-based scheduler loop with rate-limit backoff

mod coordinator;
mod fetcher;
mod frontier;
mod merger;
mod partition;
mod ranker;
mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{should_back_off, Coordinator, CrawlSummary, RoundSummary};
pub use fetcher::{
    build_http_client, FetchBatch, FetchError, FetchEvent, HttpTargetFetcher, TargetFetcher,
};
pub use frontier::{is_eligible, select_frontier, SelectionPolicy};
pub use merger::{merge_targets, MergeOutcome, ResultMerger};
pub use partition::partition;
pub use ranker::{HttpSimilarityRanker, RankError, SimilarityRanker};
pub use worker::{ChunkOutcome, CrawlWorker, RoundTally};

use crate::config::Config;
use crate::state::NodeKind;
use crate::storage::{open_graph_store, EdgeMap};
use crate::CrawlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Direction of a crawl round
///
/// `Stars` pulls the repos each user starred; `Gazers` pulls the users who
/// starred each repo. Only `Gazers` carries an authoritative total count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    Stars,
    Gazers,
}

impl CrawlMode {
    pub fn source_kind(&self) -> NodeKind {
        match self {
            Self::Stars => NodeKind::User,
            Self::Gazers => NodeKind::Repo,
        }
    }

    pub fn target_kind(&self) -> NodeKind {
        match self {
            Self::Stars => NodeKind::Repo,
            Self::Gazers => NodeKind::User,
        }
    }

    pub fn edge_map(&self) -> EdgeMap {
        match self {
            Self::Stars => EdgeMap::Stars,
            Self::Gazers => EdgeMap::Gazers,
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Self::Stars => Self::Gazers,
            Self::Gazers => Self::Stars,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stars => "stars",
            Self::Gazers => "gazers",
        }
    }
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source selected for crawling, with its resume cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSource {
    #[serde(rename = "source")]
    pub id: String,

    /// Last target stored for this source, if any
    pub cursor: Option<String>,
}

impl CrawlSource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cursor: None,
        }
    }
}

/// Runs a complete crawl against the configured collaborators
///
/// Opens the SQLite store, builds the HTTP fetcher and ranker, seeds the
/// configured nodes, and runs the scheduler loop until both directions are
/// complete or the round budget is spent.
pub async fn crawl(config: Config) -> Result<CrawlSummary, CrawlError> {
    let store = open_graph_store(Path::new(&config.output.database_path))?;

    let client = build_http_client(Duration::from_secs(config.collaborators.timeout_secs))?;
    let fetcher = HttpTargetFetcher::new(client.clone(), &config.collaborators.fetch_url);
    let ranker = HttpSimilarityRanker::new(client, &config.collaborators.rank_url);

    let mut coordinator = Coordinator::new(config, store, Arc::new(fetcher), Arc::new(ranker));
    coordinator.run().await
}
