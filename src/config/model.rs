// src/config/model.rs

//! Typed configuration model for a batch.

use std::path::{Path, PathBuf};

use crate::errors::{BatchError, Result};

/// How a failed audit-table update is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Criticality {
    /// Latch table updates off and carry on; `RETRY.flg` re-arms them.
    #[default]
    Warn,
    /// A failed update is a fatal engine error.
    Error,
}

impl Criticality {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "WARN" => Ok(Criticality::Warn),
            "ERROR" => Ok(Criticality::Error),
            other => Err(BatchError::Config(format!(
                "AuditTableCriticality must be WARN or ERROR (got '{other}')"
            ))),
        }
    }
}

/// Typed view of the flat `KEY=value` batch configuration file.
///
/// Paths come in two flavours: `Bf*` directories are shared across the whole
/// batch fleet (common logs, locks), the plain ones are per-batch.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub application_name: String,
    pub batch_name: String,

    /// Seconds between scheduler work ticks. Default 2.
    pub job_poll_interval: u64,
    /// Concurrency cap; 0 means unlimited. Default 0.
    pub max_parallel_jobs: u32,
    /// Archive directories retained after a run; 0 means unlimited. Default 3.
    pub max_archived_logs: u32,

    pub perform_audit_table_updates: bool,
    /// Seconds between relational audit upserts.
    pub audit_table_update_interval: u64,
    pub audit_table_criticality: Criticality,

    pub bf_connect_string: String,
    pub bf_user_id: String,
    pub bf_user_password: String,

    pub bf_bin_file_directory: PathBuf,
    pub bf_log_file_directory: PathBuf,
    pub bf_lock_file_directory: PathBuf,
    pub bin_file_directory: PathBuf,
    pub log_file_directory: PathBuf,
    pub poll_file_directory: PathBuf,
    pub work_file_directory: PathBuf,

    pub send_failure_message: bool,
    pub alert_email_list: String,

    /// When set, an anomalous child exit status is recovered from the tail of
    /// the job log (`status: <int>`). Off by default; the OS-reported exit
    /// code is authoritative.
    pub exit_code_log_recovery: bool,

    /// Path of the file this configuration was loaded from. Launched jobs
    /// receive it as their single argument.
    pub config_file: PathBuf,
}

impl BatchConfig {
    /// Process list location: `<BinFileDirectory>/<BatchName>.proc`.
    pub fn proc_file(&self) -> PathBuf {
        self.bin_file_directory
            .join(format!("{}.proc", self.batch_name))
    }

    /// Program to execute for a given process.
    pub fn job_program(&self, process_name: &str) -> PathBuf {
        self.bin_file_directory.join(process_name)
    }

    /// Captured stdout+stderr of a given process.
    pub fn job_log(&self, process_name: &str) -> PathBuf {
        self.log_file_directory.join(format!("{process_name}.log"))
    }

    /// Human message log, append-only.
    pub fn message_log(&self) -> PathBuf {
        self.log_file_directory
            .join(format!("{}_BatchMessage.log", self.batch_name))
    }

    /// Single-line batch audit, overwritten each tick.
    pub fn batch_audit_file(&self) -> PathBuf {
        self.log_file_directory
            .join(format!("{}_BatchAudit.log", self.batch_name))
    }

    /// Per-process audit, overwritten each tick.
    pub fn process_audit_file(&self) -> PathBuf {
        self.log_file_directory
            .join(format!("{}_ProcessAudit.log", self.batch_name))
    }

    /// Append-only history in the common log directory.
    pub fn history_file(&self) -> PathBuf {
        self.bf_log_file_directory
            .join(format!("{}_BatchHistory.log", self.batch_name))
    }

    /// Root of the per-run log archives.
    pub fn archive_root(&self) -> PathBuf {
        self.log_file_directory.join("archive")
    }

    /// Per-batch execution lock file.
    pub fn batch_lock_file(&self) -> PathBuf {
        self.bf_lock_file_directory
            .join(format!("{}.lck", self.batch_name))
    }

    /// Host-wide batch number allocator file.
    pub fn allocator_lock_file(&self) -> PathBuf {
        self.bf_lock_file_directory.join("batch_number.lck")
    }

    /// A named operator flag file in the poll directory.
    pub fn flag_file(&self, name: &str) -> PathBuf {
        self.poll_file_directory.join(name)
    }
}

/// Parse a `Y`/`N` configuration value; anything other than `Y` is false.
pub(crate) fn parse_yn(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("y")
}

/// Parse a numeric configuration value with a key name for diagnostics.
pub(crate) fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| BatchError::Config(format!("{key} must be numeric (got '{value}')")))
}

/// Require a directory key to have been provided.
pub(crate) fn require_dir(key: &str, value: Option<PathBuf>) -> Result<PathBuf> {
    value.ok_or_else(|| BatchError::Config(format!("missing mandatory key {key}")))
}

/// Require a string key to have been provided and be non-empty.
pub(crate) fn require_str(key: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(BatchError::Config(format!("missing mandatory key {key}"))),
    }
}

/// Helper used by the loader: interpret a raw value as a path.
pub(crate) fn as_path(value: &str) -> PathBuf {
    Path::new(value.trim()).to_path_buf()
}
