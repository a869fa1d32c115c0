//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `NodeKind`: Which side of the bipartite graph an identifier belongs to
//! - `NodeStatus`: Per-node crawl status (last pull time, error flag)
//! - `SchedulerPhase`: The scheduler loop's state machine

mod node;
mod phase;

pub use node::{NodeKind, NodeStatus};
pub use phase::SchedulerPhase;
