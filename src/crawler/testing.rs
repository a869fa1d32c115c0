//! In-process fetcher and ranker doubles for unit tests

use crate::crawler::{CrawlMode, CrawlSource, FetchBatch, FetchError, FetchEvent, RankError};
use crate::crawler::{SimilarityRanker, TargetFetcher};
use crate::storage::{Costar, GraphStore, SqliteStore};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub fn memory_store() -> GraphStore {
    GraphStore::new(Arc::new(SqliteStore::new_in_memory().unwrap()))
}

/// Answers fetches from a fixed adjacency table
#[derive(Default)]
pub struct ScriptedFetcher {
    targets: HashMap<String, Vec<String>>,
    totals: HashMap<String, u64>,
    failing: HashSet<String>,
    silent: HashSet<String>,
    quota_exhausted: bool,
    rate_limited: bool,
    broken: bool,
    calls: Mutex<Vec<(CrawlMode, Vec<CrawlSource>)>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_targets(mut self, source: &str, targets: &[&str]) -> Self {
        self.targets.insert(
            source.to_string(),
            targets.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn with_total(mut self, source: &str, total: u64) -> Self {
        self.totals.insert(source.to_string(), total);
        self
    }

    pub fn failing(mut self, source: &str) -> Self {
        self.failing.insert(source.to_string());
        self
    }

    /// Sources that get no event at all
    pub fn silent(mut self, source: &str) -> Self {
        self.silent.insert(source.to_string());
        self
    }

    pub fn quota_exhausted(mut self) -> Self {
        self.quota_exhausted = true;
        self
    }

    pub fn rate_limited(mut self) -> Self {
        self.rate_limited = true;
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn calls(&self) -> Vec<(CrawlMode, Vec<CrawlSource>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TargetFetcher for ScriptedFetcher {
    async fn fetch(&self, mode: CrawlMode, sources: &[CrawlSource]) -> Result<FetchBatch, FetchError> {
        self.calls.lock().unwrap().push((mode, sources.to_vec()));

        if self.rate_limited {
            return Err(FetchError::RateLimited);
        }
        if self.broken {
            return Err(FetchError::Status { status: 502 });
        }

        let events = sources
            .iter()
            .filter(|source| !self.silent.contains(&source.id))
            .map(|source| {
                if self.failing.contains(&source.id) {
                    FetchEvent::Fail {
                        source: source.id.clone(),
                    }
                } else {
                    FetchEvent::Complete {
                        source: source.id.clone(),
                        targets: self.targets.get(&source.id).cloned().unwrap_or_default(),
                        total_count: self.totals.get(&source.id).copied(),
                    }
                }
            })
            .collect();

        Ok(FetchBatch {
            events,
            queries_left: !self.quota_exhausted,
        })
    }
}

/// Records every repo it is asked to rank
#[derive(Default)]
pub struct CountingRanker {
    calls: Mutex<Vec<String>>,
    failing: bool,
}

impl CountingRanker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimilarityRanker for CountingRanker {
    async fn rank(&self, repo: &str) -> Result<Vec<Costar>, RankError> {
        self.calls.lock().unwrap().push(repo.to_string());
        if self.failing {
            return Err(RankError::Status { status: 500 });
        }
        Ok(vec![Costar {
            repo: format!("{}-twin", repo),
            score: 0.75,
        }])
    }
}
