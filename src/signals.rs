// src/signals.rs

//! Operator control plane: flag files polled from the poll directory.
//!
//! - `PAUSE.flg` — suppress new launches while present.
//! - `STOP.flg`  — suppress new launches; the batch exits 5 if work remains.
//! - `RETRY.flg` — re-arm audit table updates; consumed (deleted) on sight.
//! - `TEST.flg`  — startup only: force test mode.
//! - `RES.flg`   — startup only: request resurrection.
//!
//! Pause and stop are level signals with edge-triggered logging: each entry
//! and exit is logged exactly once.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Edges observed during one poll, for the engine's message log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalEdges {
    pub pause_entered: bool,
    pub pause_exited: bool,
    pub stop_entered: bool,
    pub stop_exited: bool,
    /// `RETRY.flg` was seen (and deleted).
    pub retry: bool,
}

/// Polls the flag files each tick and tracks pause/stop levels.
#[derive(Debug)]
pub struct SignalMonitor {
    poll_dir: PathBuf,
    pub paused: bool,
    pub stopped: bool,
}

impl SignalMonitor {
    pub fn new(poll_dir: impl Into<PathBuf>) -> Self {
        Self {
            poll_dir: poll_dir.into(),
            paused: false,
            stopped: false,
        }
    }

    /// Startup-only check: `TEST.flg` forces test mode.
    pub fn test_flag_present(&self) -> bool {
        self.flag(&self.poll_dir.join("TEST.flg"))
    }

    /// Startup-only check: `RES.flg` requests resurrection.
    pub fn resurrect_flag_present(&self) -> bool {
        self.flag(&self.poll_dir.join("RES.flg"))
    }

    /// Scan the poll directory once, updating pause/stop levels and
    /// consuming `RETRY.flg`.
    pub fn poll(&mut self) -> SignalEdges {
        let mut edges = SignalEdges::default();

        let pause = self.flag(&self.poll_dir.join("PAUSE.flg"));
        if pause && !self.paused {
            info!("PAUSE flag detected; suspending new launches");
            edges.pause_entered = true;
        } else if !pause && self.paused {
            info!("PAUSE flag removed; resuming launches");
            edges.pause_exited = true;
        }
        self.paused = pause;

        let stop = self.flag(&self.poll_dir.join("STOP.flg"));
        if stop && !self.stopped {
            info!("STOP flag detected; no further processes will be launched");
            edges.stop_entered = true;
        } else if !stop && self.stopped {
            info!("STOP flag removed");
            edges.stop_exited = true;
        }
        self.stopped = stop;

        let retry_path = self.poll_dir.join("RETRY.flg");
        if self.flag(&retry_path) {
            info!("RETRY flag detected; re-arming audit table updates");
            if let Err(e) = fs::remove_file(&retry_path) {
                warn!(path = %retry_path.display(), error = %e, "cannot delete RETRY flag");
            }
            edges.retry = true;
        }

        edges
    }

    fn flag(&self, path: &Path) -> bool {
        path.exists()
    }
}
