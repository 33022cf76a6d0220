// src/engine/mod.rs

//! The batch execution engine.
//!
//! [`runtime`] owns the tick-driven scheduler loop; [`archive`] copies the
//! run's log files aside and prunes old archives on exit. Everything the
//! loop touches is bundled into one [`Engine`] value, so each step is an
//! explicit method call with no hidden global state.

pub mod archive;
pub mod runtime;

pub use runtime::Engine;

use std::time::Duration;

use crate::status::BatchType;

/// Final process exit codes of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every process completed successfully.
    Success,
    /// Pre-loop initialization failure (config, process list, locks).
    InitError,
    /// Critical engine error mid-run (spawn failure, audit write failure).
    EngineError,
    /// Stopped by `STOP.flg` with processes still waiting.
    Stopped,
    /// At least one process failed; running work was drained first.
    JobFailed,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::InitError => 1,
            ExitCode::EngineError => 2,
            ExitCode::Stopped => 5,
            ExitCode::JobFailed => 6,
        }
    }
}

/// What the caller asked for on the command line, resolved into engine
/// terms. Kept separate from the clap types so the engine can be driven
/// directly from tests.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    /// Batch alias; defaults to the batch name.
    pub alias: Option<String>,
    /// Explicit batch number (`YYYYMMDDHH24MISS`); otherwise allocated.
    pub batch_number: Option<String>,
    /// Explicit process date; otherwise the current wall clock.
    pub process_date: Option<String>,
    /// Explicit batch type; otherwise derived from `RUN_BY_CRON`.
    pub batch_type: Option<BatchType>,
    /// Resurrect the previous failed run.
    pub resurrect: bool,
    /// Simulate all jobs instead of spawning them.
    pub test_mode: bool,
}

/// Loop pacing. Production uses the defaults; tests shrink them.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Outer sleep between loop iterations.
    pub tick: Duration,
    /// Override for the work gate; defaults to `JobPollInterval` seconds.
    pub poll: Option<Duration>,
    /// Override for the audit throttle; defaults to
    /// `AuditTableUpdateInterval` seconds.
    pub audit: Option<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            poll: None,
            audit: None,
        }
    }
}
