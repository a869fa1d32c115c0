//! Statistics generation from the graph store
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::state::NodeKind;
use crate::storage::{GraphStore, Keyspace, StorageResult};

/// Status counts for one node kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub total: u64,
    /// Crawled successfully at least once
    pub pulled: u64,
    /// Never crawled
    pub pending: u64,
    /// Last crawl failed
    pub errored: u64,
}

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStatistics {
    pub users: KindCounts,
    pub repos: KindCounts,

    /// Users with a stored star list
    pub star_lists: u64,

    /// Repos with a stored gazer list
    pub gazer_lists: u64,

    pub num_gazers: u64,
    pub costars: u64,
}

/// Loads statistics from storage
///
/// Walks the whole status keyspace once; the other figures are key counts.
pub fn load_statistics(store: &GraphStore) -> StorageResult<GraphStatistics> {
    let mut stats = GraphStatistics::default();

    for entry in store.statuses() {
        let (_, status) = entry?;
        let counts = match status.kind {
            NodeKind::User => &mut stats.users,
            NodeKind::Repo => &mut stats.repos,
        };
        counts.total += 1;
        if status.had_error {
            counts.errored += 1;
        } else if status.last_pulled.is_some() {
            counts.pulled += 1;
        } else {
            counts.pending += 1;
        }
    }

    stats.star_lists = store.count(Keyspace::Stars)?;
    stats.gazer_lists = store.count(Keyspace::Gazers)?;
    stats.num_gazers = store.count(Keyspace::NumGazers)?;
    stats.costars = store.count(Keyspace::Costars)?;

    Ok(stats)
}

/// Prints statistics to stdout in a human-readable format
pub fn print_statistics(stats: &GraphStatistics) {
    println!("=== Stargazer Graph Statistics ===\n");

    for (label, counts) in [("Users", &stats.users), ("Repos", &stats.repos)] {
        println!("{}: {}", label, counts.total);
        println!("  Pulled:  {}", counts.pulled);
        println!("  Pending: {}", counts.pending);
        println!("  Errored: {}", counts.errored);
        println!();
    }

    println!("Star lists:      {}", stats.star_lists);
    println!("Gazer lists:     {}", stats.gazer_lists);
    println!("Gazer counts:    {}", stats.num_gazers);
    println!("Costar rankings: {}", stats.costars);
}
