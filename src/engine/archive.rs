// src/engine/archive.rs

//! End-of-run log archiving.
//!
//! Every file in the batch log directory is copied to
//! `archive/<batch_number>.<run_number>/`; archive directories beyond the
//! retention count are then removed, oldest first. Reverse-lexical ordering
//! of directory names matches chronological order because batch numbers are
//! `YYYYMMDDHH24MISS`.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::BatchConfig;
use crate::errors::Result;
use crate::status::BatchState;

/// Copy the run's log files into a per-run archive directory and prune old
/// archives.
pub fn archive_logs(cfg: &BatchConfig, batch: &BatchState) -> Result<()> {
    let root = cfg.archive_root();
    let dest = root.join(format!("{}.{}", batch.batch_number, batch.run_number));
    fs::create_dir_all(&dest)?;

    for entry in fs::read_dir(&cfg.log_file_directory)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() {
            fs::copy(&path, dest.join(entry.file_name()))?;
        }
    }

    info!(archive = %dest.display(), "log files archived");
    prune_archives(&root, cfg.max_archived_logs)?;
    Ok(())
}

/// Remove archive directories beyond the newest `keep`; `keep == 0` retains
/// everything.
pub fn prune_archives(root: &Path, keep: u32) -> Result<()> {
    if keep == 0 {
        return Ok(());
    }

    let mut names: Vec<String> = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    // Newest first; correct only while batch numbers stay fixed-width
    // timestamps.
    names.sort_by(|a, b| b.cmp(a));

    for stale in names.iter().skip(keep as usize) {
        let path = root.join(stale);
        match fs::remove_dir_all(&path) {
            Ok(()) => debug!(archive = %path.display(), "pruned old log archive"),
            Err(e) => {
                warn!(archive = %path.display(), error = %e, "cannot prune log archive")
            }
        }
    }

    Ok(())
}
