// src/proclist/mod.rs

//! Process list parsing, the predecessor graph, and validation.
//!
//! - [`loader`] parses the CSV-like `<BatchName>.proc` file, handling the
//!   comment conventions and commented-out predecessor pruning.
//! - [`graph`] holds the predecessor/dependent adjacency for scheduling.
//! - [`validate`] rejects duplicate names, undefined predecessors and
//!   cycles before anything is launched.

pub mod graph;
pub mod loader;
pub mod validate;

pub use graph::DepGraph;
pub use loader::{load_process_list, ProcessEntry, ProcessList};
pub use validate::validate_process_list;

/// A process whose name contains this substring is a synthetic sync point:
/// it executes no command and completes after one poll cycle.
pub const MILESTONE_MARKER: &str = "Milestone";

/// Whether a process name denotes a milestone node.
pub fn is_milestone(name: &str) -> bool {
    name.contains(MILESTONE_MARKER)
}
