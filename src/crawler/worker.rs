//! Crawl worker: drives the target fetcher for one chunk
//!
//! A worker fetches its chunk, hands each event to the merger, and returns
//! its own tally. Tallies from all workers are combined by the coordinator
//! after the round's join, so no counter is shared between tasks.

use crate::crawler::{CrawlMode, CrawlSource, FetchBatch, FetchError, FetchEvent};
use crate::crawler::{ResultMerger, TargetFetcher};
use crate::output::{emit_symbol, success_symbol, FAILURE_SYMBOL};
use crate::storage::StorageResult;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

/// Per-source counts for a chunk or a whole round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundTally {
    pub succeeded: u64,
    pub failed: u64,
    pub discovered: u64,
    pub costars: u64,
}

impl RoundTally {
    pub fn processed(&self) -> u64 {
        self.succeeded + self.failed
    }

    pub fn absorb(&mut self, other: &RoundTally) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.discovered += other.discovered;
        self.costars += other.costars;
    }
}

/// Result of one worker's chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub tally: RoundTally,

    /// False when the external quota ran out while fetching this chunk
    pub queries_left: bool,
}

#[derive(Clone)]
pub struct CrawlWorker {
    fetcher: Arc<dyn TargetFetcher>,
    merger: Arc<ResultMerger>,
    symbols: bool,
}

impl CrawlWorker {
    pub fn new(fetcher: Arc<dyn TargetFetcher>, merger: Arc<ResultMerger>, symbols: bool) -> Self {
        Self {
            fetcher,
            merger,
            symbols,
        }
    }

    /// Fetches and merges every source of `chunk`
    ///
    /// A fetch error fails every source of the chunk. Quota exhaustion
    /// leaves every source without an event untouched so it is selected
    /// again. With quota left, a source the fetcher never reports on is
    /// recorded as failed. Only storage errors propagate.
    pub async fn run_chunk(&self, mode: CrawlMode, chunk: Vec<CrawlSource>) -> StorageResult<ChunkOutcome> {
        let batch = match self.fetcher.fetch(mode, &chunk).await {
            Ok(batch) => batch,
            Err(FetchError::RateLimited) => {
                tracing::warn!(
                    "Quota exhausted before {} chunk of {} sources",
                    mode,
                    chunk.len()
                );
                return Ok(ChunkOutcome {
                    tally: RoundTally::default(),
                    queries_left: false,
                });
            }
            Err(e) => {
                tracing::warn!("Fetch of {} chunk failed: {}", mode, e);
                FetchBatch {
                    events: chunk
                        .iter()
                        .map(|source| FetchEvent::Fail {
                            source: source.id.clone(),
                        })
                        .collect(),
                    queries_left: true,
                }
            }
        };

        let mut tally = RoundTally::default();
        let mut pending: HashSet<&str> = chunk.iter().map(|source| source.id.as_str()).collect();

        for event in &batch.events {
            if !pending.remove(event.source()) {
                tracing::debug!("Ignoring event for undispatched source {}", event.source());
                continue;
            }

            match event {
                FetchEvent::Complete {
                    source,
                    targets,
                    total_count,
                } => {
                    let merged = self
                        .merger
                        .on_complete(mode, source, targets, *total_count, Utc::now())
                        .await?;
                    tally.succeeded += 1;
                    tally.discovered += merged.discovered as u64;
                    if merged.costars_computed {
                        tally.costars += 1;
                    }
                    self.symbol(success_symbol(mode.source_kind()));
                }
                FetchEvent::Fail { source } => {
                    self.merger.on_fail(mode, source, Utc::now())?;
                    tally.failed += 1;
                    self.symbol(FAILURE_SYMBOL);
                }
            }
        }

        if !batch.queries_left && !pending.is_empty() {
            // Quota ran out mid-chunk: sources never reached stay eligible
            tracing::debug!(
                "Quota exhausted with {} {} sources unreported",
                pending.len(),
                mode
            );
        } else {
            for source in &chunk {
                if pending.contains(source.id.as_str()) {
                    tracing::debug!("No result reported for {}", source.id);
                    self.merger.on_fail(mode, &source.id, Utc::now())?;
                    tally.failed += 1;
                    self.symbol(FAILURE_SYMBOL);
                }
            }
        }

        Ok(ChunkOutcome {
            tally,
            queries_left: batch.queries_left,
        })
    }

    fn symbol(&self, symbol: char) {
        if self.symbols {
            emit_symbol(symbol);
        }
    }
}
