// src/audit/files.rs

//! Flat-file audit: the single-line batch audit, the per-process audit, and
//! the append-only batch history.
//!
//! These files are the source of truth for resurrection and the
//! history-based last-success resolver, so the writers and readers share one
//! field layout and must round-trip exactly.
//!
//! Field layouts (`|`-separated):
//!
//! - batch audit:
//!   `batch_number|run_number|batch_name|process_date|batch_status|start|end|batch_type|batch_alias`
//! - process audit (one line per process, list order):
//!   `batch_number|run_number|process_name|process_status|start|end`

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{BatchError, Result};
use crate::status::{BatchState, ProcessState, StatusStore};

/// Paths of the three flat audit files for one batch.
#[derive(Debug, Clone)]
pub struct FileAudit {
    batch_audit: PathBuf,
    process_audit: PathBuf,
    history: PathBuf,
}

impl FileAudit {
    pub fn new(batch_audit: PathBuf, process_audit: PathBuf, history: PathBuf) -> Self {
        Self {
            batch_audit,
            process_audit,
            history,
        }
    }

    /// Overwrite the batch audit file with the current batch state.
    ///
    /// The end-time field is written only once the batch is terminal.
    pub fn write_batch(&self, batch: &BatchState) -> Result<()> {
        let line = batch_audit_line(batch);
        let mut file = File::create(&self.batch_audit).map_err(write_err(&self.batch_audit))?;
        writeln!(file, "{line}").map_err(write_err(&self.batch_audit))?;
        file.flush().map_err(write_err(&self.batch_audit))?;
        Ok(())
    }

    /// Overwrite the process audit file: one line per process, list order.
    pub fn write_processes(&self, batch: &BatchState, store: &StatusStore) -> Result<()> {
        let mut file =
            File::create(&self.process_audit).map_err(write_err(&self.process_audit))?;
        for record in store.iter() {
            writeln!(
                file,
                "{}|{}|{}|{}|{}|{}",
                batch.batch_number,
                record.run_number,
                record.name,
                record.state,
                record.start_time,
                record.end_time,
            )
            .map_err(write_err(&self.process_audit))?;
        }
        file.flush().map_err(write_err(&self.process_audit))?;
        Ok(())
    }

    /// Append the current batch audit line to the history file, verbatim.
    pub fn append_history(&self) -> Result<()> {
        let line = fs::read_to_string(&self.batch_audit).map_err(write_err(&self.batch_audit))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.history)
            .map_err(write_err(&self.history))?;
        file.write_all(line.as_bytes())
            .map_err(write_err(&self.history))?;
        file.flush().map_err(write_err(&self.history))?;
        Ok(())
    }
}

fn write_err(path: &Path) -> impl Fn(std::io::Error) -> BatchError + '_ {
    move |e| BatchError::Audit(format!("cannot write audit file {}: {e}", path.display()))
}

fn batch_audit_line(batch: &BatchState) -> String {
    let end_time = if batch.status.is_terminal() {
        batch.end_time.as_str()
    } else {
        ""
    };
    format!(
        "{}|{}|{}|{}|{}|{}|{}|{}|{}",
        batch.batch_number,
        batch.run_number,
        batch.batch_name,
        batch.process_date,
        batch.status,
        batch.start_time,
        end_time,
        batch.batch_type,
        batch.batch_alias,
    )
}

/// One parsed process audit line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessAuditRow {
    pub batch_number: String,
    pub run_number: u32,
    pub process_name: String,
    pub status: ProcessState,
    pub start_time: String,
    pub end_time: String,
}

/// Read a process audit file into rows, file order preserved.
///
/// Returns an empty vector when the file does not exist (first run).
pub fn read_process_audit(path: impl AsRef<Path>) -> Result<Vec<ProcessAuditRow>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| BatchError::Audit(format!("cannot read {}: {e}", path.display())))?;

    let mut rows = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() != 6 {
            return Err(BatchError::Audit(format!(
                "malformed process audit line {} in {}: expected 6 fields, got {}",
                lineno + 1,
                path.display(),
                fields.len()
            )));
        }
        rows.push(ProcessAuditRow {
            batch_number: fields[0].to_string(),
            run_number: fields[1].trim().parse().map_err(|_| {
                BatchError::Audit(format!(
                    "malformed run number '{}' in {}",
                    fields[1],
                    path.display()
                ))
            })?,
            process_name: fields[2].to_string(),
            status: ProcessState::parse(fields[3])?,
            start_time: fields[4].to_string(),
            end_time: fields[5].to_string(),
        });
    }

    Ok(rows)
}

/// One parsed batch audit (or history) line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchAuditRow {
    pub batch_number: String,
    pub run_number: u32,
    pub batch_name: String,
    pub process_date: String,
    pub batch_status: String,
    pub start_time: String,
    pub end_time: String,
    pub batch_type: String,
    pub batch_alias: String,
}

/// Parse one batch audit line; `None` for blank or malformed lines (history
/// files can accumulate lines from older layouts, which are skipped).
pub fn parse_batch_audit_line(line: &str) -> Option<BatchAuditRow> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() != 9 {
        return None;
    }
    Some(BatchAuditRow {
        batch_number: fields[0].to_string(),
        run_number: fields[1].trim().parse().ok()?,
        batch_name: fields[2].to_string(),
        process_date: fields[3].to_string(),
        batch_status: fields[4].to_string(),
        start_time: fields[5].to_string(),
        end_time: fields[6].to_string(),
        batch_type: fields[7].to_string(),
        batch_alias: fields[8].to_string(),
    })
}
