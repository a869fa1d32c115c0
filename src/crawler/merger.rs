//! Result merger: applies fetch outcomes to the stores
//!
//! On success the merger unions the fetched targets into the stored edge
//! list, stamps the source's status, refreshes the repo gazer count,
//! registers never-seen targets, and refreshes costars when the repo has
//! enough gazers. On failure it only flags the source.
//!
//! Both handlers are safe to call from concurrent workers: sources never
//! overlap between chunks, and a target discovered twice is written with the
//! same value both times.

use crate::crawler::{CrawlMode, SimilarityRanker};
use crate::state::{NodeKind, NodeStatus};
use crate::storage::{CostarsRecord, GraphStore, StorageResult};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// What one successful merge changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Targets that had no status record before this merge
    pub discovered: usize,

    /// A fresh costars record was stored
    pub costars_computed: bool,
}

/// Unions `incoming` into `existing`
///
/// Existing elements keep their order and come first; new elements follow in
/// fetch order. Duplicates on either side are dropped.
pub fn merge_targets(existing: Vec<String>, incoming: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(existing.len() + incoming.len());
    let mut merged = Vec::with_capacity(existing.len() + incoming.len());

    for target in existing.into_iter().chain(incoming.iter().cloned()) {
        if seen.insert(target.clone()) {
            merged.push(target);
        }
    }

    merged
}

pub struct ResultMerger {
    store: GraphStore,
    ranker: Arc<dyn SimilarityRanker>,
    costars_threshold: u64,
}

impl ResultMerger {
    pub fn new(store: GraphStore, ranker: Arc<dyn SimilarityRanker>, costars_threshold: u64) -> Self {
        Self {
            store,
            ranker,
            costars_threshold,
        }
    }

    /// Applies a successful fetch of `source`
    pub async fn on_complete(
        &self,
        mode: CrawlMode,
        source: &str,
        targets: &[String],
        total_count: Option<u64>,
        now: DateTime<Utc>,
    ) -> StorageResult<MergeOutcome> {
        let edge_map = mode.edge_map();
        let existing = self.store.get_edges(edge_map, source)?;
        let merged = merge_targets(existing, targets);

        self.store
            .put_status(source, &NodeStatus::pulled(mode.source_kind(), now))?;
        self.store.put_edges(edge_map, source, &merged)?;

        let known_gazers = if mode.source_kind() == NodeKind::Repo {
            let count = total_count.unwrap_or(merged.len() as u64);
            self.store.put_num_gazers(source, count)?;
            Some(count)
        } else {
            None
        };

        let discovered = self.discover(mode.target_kind(), targets)?;

        let costars_computed = match known_gazers {
            Some(count) if count > self.costars_threshold => {
                self.refresh_costars(source, now).await?
            }
            _ => false,
        };

        tracing::trace!(
            "Merged {} {}: {} targets, {} discovered",
            mode,
            source,
            merged.len(),
            discovered
        );

        Ok(MergeOutcome {
            discovered,
            costars_computed,
        })
    }

    /// Flags `source` as failed; edges and derived data stay as they were
    pub fn on_fail(&self, mode: CrawlMode, source: &str, now: DateTime<Utc>) -> StorageResult<()> {
        tracing::trace!("Fetch failed for {} {}", mode.source_kind(), source);
        self.store
            .put_status(source, &NodeStatus::failed(mode.source_kind(), now))
    }

    /// Creates discovered statuses for targets without one
    fn discover(&self, kind: NodeKind, targets: &[String]) -> StorageResult<usize> {
        let mut seen = HashSet::with_capacity(targets.len());
        let unique: Vec<String> = targets
            .iter()
            .filter(|target| seen.insert(target.as_str()))
            .cloned()
            .collect();

        let existing = self.store.get_statuses(&unique)?;
        let fresh: Vec<(String, NodeStatus)> = unique
            .into_iter()
            .zip(existing)
            .filter(|(_, status)| status.is_none())
            .map(|(id, _)| (id, NodeStatus::discovered(kind)))
            .collect();

        self.store.put_statuses(&fresh)?;
        Ok(fresh.len())
    }

    async fn refresh_costars(&self, repo: &str, now: DateTime<Utc>) -> StorageResult<bool> {
        match self.ranker.rank(repo).await {
            Ok(ranked) => {
                self.store.put_costars(
                    repo,
                    &CostarsRecord {
                        computed_at: now,
                        ranked,
                    },
                )?;
                Ok(true)
            }
            Err(e) => {
                tracing::warn!("Similarity ranking failed for {}: {}", repo, e);
                Ok(false)
            }
        }
    }
}
