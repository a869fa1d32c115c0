//! Output module for crawl progress and statistics
//!
//! This module provides:
//! - Per-item progress symbols on stdout
//! - Periodic aggregate progress lines
//! - Graph statistics for the `--stats` mode

mod progress;
mod stats;

pub use progress::{emit_symbol, end_symbol_line, success_symbol, ProgressLog, FAILURE_SYMBOL};
pub use stats::{load_statistics, print_statistics, GraphStatistics, KindCounts};
