// src/locks.rs

//! Advisory file locks: the per-batch execution lock and the host-wide
//! batch number allocator.
//!
//! Both rely on OS advisory locking (`flock`-style via `fs2`), so a crashed
//! engine never leaves a batch permanently locked: the kernel releases the
//! lock when the process dies.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::clock;
use crate::errors::{BatchError, Result};

/// Exclusive lock preventing two concurrent invocations of the same batch.
///
/// Held for the engine's entire lifetime; unlocked and removed on drop.
#[derive(Debug)]
pub struct BatchLock {
    file: File,
    path: PathBuf,
}

impl BatchLock {
    /// Take the lock, failing immediately if another invocation holds it.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| {
                BatchError::Lock(format!(
                    "cannot open batch lock file {}: {e}",
                    path.display()
                ))
            })?;

        file.try_lock_exclusive().map_err(|e| {
            BatchError::Lock(format!(
                "batch is already running (lock {} held): {e}",
                path.display()
            ))
        })?;

        info!(path = %path.display(), "batch lock acquired");
        Ok(Self { file, path })
    }
}

impl Drop for BatchLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!(path = %self.path.display(), error = %e, "failed to unlock batch lock");
        }
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove batch lock file");
        }
        debug!(path = %self.path.display(), "batch lock released");
    }
}

/// Allocate a strictly-monotonic 14-digit `YYYYMMDDHH24MISS` batch number.
///
/// The allocator file records the last number handed out on this host. Under
/// an exclusive lock, the caller sleeps one second at a time until the
/// current compact timestamp is strictly greater than the recorded one, then
/// records and returns it. Concurrent invocations therefore always obtain
/// strictly increasing numbers.
pub fn allocate_batch_number(allocator_file: impl AsRef<Path>) -> Result<String> {
    let path = allocator_file.as_ref();
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| {
            BatchError::Lock(format!(
                "cannot open allocator lock file {}: {e}",
                path.display()
            ))
        })?;

    // Blocks until any concurrent allocation finishes.
    file.lock_exclusive().map_err(|e| {
        BatchError::Lock(format!(
            "cannot lock allocator file {}: {e}",
            path.display()
        ))
    })?;

    let result = allocate_locked(&mut file);

    if let Err(e) = file.unlock() {
        warn!(path = %path.display(), error = %e, "failed to unlock allocator file");
    }

    result
}

fn allocate_locked(file: &mut File) -> Result<String> {
    let mut recorded = String::new();
    file.read_to_string(&mut recorded)?;
    let recorded = recorded.trim().to_string();

    let mut number = clock::now_compact();
    while !recorded.is_empty() && number <= recorded {
        debug!(recorded = %recorded, "waiting for batch number timestamp to advance");
        thread::sleep(Duration::from_secs(1));
        number = clock::now_compact();
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(number.as_bytes())?;
    file.flush()?;

    info!(batch_number = %number, "batch number allocated");
    Ok(number)
}
