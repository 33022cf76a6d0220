// src/exec/mod.rs

//! Job execution: the launcher abstraction and the production process
//! launcher.
//!
//! Real commands, milestones and test-mode simulations all share one
//! contract: `launch` produces a [`JobHandle`], `poll` reports
//! [`JobPoll::Running`] until the job is done. The engine talks to a
//! [`JobLauncher`] instead of spawning directly, so tests can substitute a
//! scripted launcher.

pub mod launcher;

pub use launcher::ProcessLauncher;

use std::path::PathBuf;

use crate::errors::Result;

/// What kind of work a launch represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// A real external program.
    Command,
    /// No process is spawned: milestones and test-mode simulations complete
    /// after one poll cycle.
    Synthetic,
}

/// Everything the launcher needs to start one job.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub name: String,
    pub kind: JobKind,
    /// Program to execute (`<BinFileDirectory>/<process_name>`).
    pub program: PathBuf,
    /// Single argument passed to the program.
    pub config_file: PathBuf,
    /// File receiving the job's stdout and stderr.
    pub log_file: PathBuf,
    /// Environment exported to the child.
    pub env: Vec<(String, String)>,
}

/// A started job being monitored by the scheduler loop.
#[derive(Debug)]
pub enum JobHandle {
    /// Live OS child plus the log file used for exit-status recovery.
    Child {
        child: tokio::process::Child,
        log_file: PathBuf,
    },
    /// Synthetic tick counter: 0 at launch, incremented per poll, done once
    /// it exceeds 1.
    Synthetic { polls: u32 },
}

impl JobHandle {
    pub fn pid(&self) -> Option<u32> {
        match self {
            JobHandle::Child { child, .. } => child.id(),
            JobHandle::Synthetic { .. } => None,
        }
    }
}

/// Final outcome of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Failed(i32),
}

/// Result of polling a running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPoll {
    Running,
    Done(JobOutcome),
}

/// Trait abstracting how jobs are started and observed.
///
/// Production code uses [`ProcessLauncher`]; tests can provide their own
/// implementation that never touches the OS.
pub trait JobLauncher: Send {
    /// Start the job described by `spec`.
    fn launch(&mut self, spec: &JobSpec) -> Result<JobHandle>;

    /// Check whether a previously launched job has finished.
    fn poll(&mut self, name: &str, handle: &mut JobHandle) -> Result<JobPoll>;
}
