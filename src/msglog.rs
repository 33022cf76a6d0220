// src/msglog.rs

//! The contractual batch message log: `<batch>_BatchMessage.log`.
//!
//! A plain append-only file of wall-clock-timestamped lines, readable by
//! operators without tooling. Engine events are mirrored here in addition
//! to the `tracing` console output.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::clock;
use crate::errors::{BatchError, Result};

#[derive(Debug)]
pub struct MessageLog {
    file: File,
    path: PathBuf,
}

impl MessageLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                BatchError::Audit(format!(
                    "cannot open batch message log {}: {e}",
                    path.display()
                ))
            })?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line. Message-log write failures are warned
    /// about but never abort the batch: the message log is for humans, the
    /// audit files are the contract.
    pub fn log(&mut self, message: &str) {
        let line = format!("{}  {}\n", clock::now_wall(), message);
        if let Err(e) = self.file.write_all(line.as_bytes()).and_then(|()| self.file.flush()) {
            warn!(path = %self.path.display(), error = %e, "cannot write batch message log");
        }
    }
}
