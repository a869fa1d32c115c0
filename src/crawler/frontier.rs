//! Frontier selection from the status store
//!
//! This module decides which nodes need (re)crawling:
//! - Never-pulled nodes are always eligible
//! - Pulled nodes become eligible once older than the freshness window
//! - Failed nodes stay out unless a retry cooldown is configured
//!
//! Selection walks the status keyspace in key order. There is no priority
//! ranking; for a fixed store state the result is deterministic.

use crate::config::Config;
use crate::crawler::{CrawlMode, CrawlSource};
use crate::state::{NodeKind, NodeStatus};
use crate::storage::{GraphStore, StorageResult};
use chrono::{DateTime, Duration, Utc};

const SKIP_LOG_EVERY: u64 = 100_000;

/// Parameters for one frontier selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Nodes pulled within this window are fresh and skipped
    pub freshness: Duration,

    /// Maximum number of sources returned
    pub batch_size: usize,

    /// Failed nodes older than this become eligible again; never if `None`
    pub retry_failed_after: Option<Duration>,
}

impl SelectionPolicy {
    pub fn for_mode(config: &Config, mode: CrawlMode) -> Self {
        let batch_size = match mode {
            CrawlMode::Stars => config.stars.batch_size,
            CrawlMode::Gazers => config.gazers.batch_size,
        };
        Self {
            freshness: config.crawler.freshness(),
            batch_size,
            retry_failed_after: config.crawler.retry_failed_after(),
        }
    }
}

/// Returns true if a node of `kind` with this status should be crawled at `now`
pub fn is_eligible(
    status: &NodeStatus,
    kind: NodeKind,
    policy: &SelectionPolicy,
    now: DateTime<Utc>,
) -> bool {
    if status.kind != kind {
        return false;
    }

    match (status.had_error, status.last_pulled) {
        (false, None) => true,
        (false, Some(pulled)) => older_than(pulled, policy.freshness, now),
        (true, Some(failed)) => policy
            .retry_failed_after
            .map_or(false, |cooldown| older_than(failed, cooldown, now)),
        (true, None) => policy.retry_failed_after.is_some(),
    }
}

/// `at` lies before `now - window`; a window reaching past the calendar's
/// start never expires
fn older_than(at: DateTime<Utc>, window: Duration, now: DateTime<Utc>) -> bool {
    now.checked_sub_signed(window)
        .map_or(false, |cutoff| at < cutoff)
}

/// Selects up to `policy.batch_size` sources for `mode`
///
/// Each source is paired with its resume cursor, the last target already
/// stored for it. An empty result means no source of this node type is
/// eligible any more.
pub fn select_frontier(
    store: &GraphStore,
    mode: CrawlMode,
    policy: &SelectionPolicy,
    now: DateTime<Utc>,
) -> StorageResult<Vec<CrawlSource>> {
    if policy.batch_size == 0 {
        return Ok(Vec::new());
    }

    let kind = mode.source_kind();
    let mut ids: Vec<String> = Vec::with_capacity(policy.batch_size.min(4096));
    let mut skipped: u64 = 0;

    for entry in store.statuses() {
        let (id, status) = entry?;

        if is_eligible(&status, kind, policy, now) {
            ids.push(id);
            if ids.len() >= policy.batch_size {
                break;
            }
        } else if status.kind == kind {
            skipped += 1;
            if skipped % SKIP_LOG_EVERY == 0 {
                tracing::info!("skipped {} {}s", skipped, kind);
            }
        }
    }

    tracing::debug!(
        "Selected {} {} sources ({} fresh or failed skipped)",
        ids.len(),
        kind,
        skipped
    );

    let cursors = store.last_targets(mode.edge_map(), &ids)?;
    Ok(ids
        .into_iter()
        .zip(cursors)
        .map(|(id, cursor)| CrawlSource { id, cursor })
        .collect())
}
