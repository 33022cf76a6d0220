// src/config/loader.rs

//! Flat `KEY=value` configuration file parser.
//!
//! The format is deliberately primitive: one `KEY=value` or `KEY="value"`
//! pair per line, matching surrounding double quotes stripped, everything
//! else ignored. Unknown keys are ignored so one config file can serve
//! several collaborating tools.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{
    as_path, parse_num, parse_yn, require_dir, require_str, BatchConfig, Criticality,
};
use crate::errors::{BatchError, Result};

/// Load a [`BatchConfig`] from a flat `KEY=value` file.
///
/// Fails if the file is unreadable or a mandatory key is missing. Semantic
/// checks (interval ordering etc.) live in [`super::validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<BatchConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        BatchError::Config(format!("cannot read config file {}: {e}", path.display()))
    })?;

    let mut application_name: Option<String> = None;
    let mut batch_name: Option<String> = None;
    let mut job_poll_interval: u64 = 2;
    let mut max_parallel_jobs: u32 = 0;
    let mut max_archived_logs: u32 = 3;
    let mut perform_audit_table_updates = false;
    let mut audit_table_update_interval: u64 = 2;
    let mut audit_table_criticality = Criticality::Warn;
    let mut bf_connect_string = String::new();
    let mut bf_user_id = String::new();
    let mut bf_user_password = String::new();
    let mut bf_bin_file_directory: Option<PathBuf> = None;
    let mut bf_log_file_directory: Option<PathBuf> = None;
    let mut bf_lock_file_directory: Option<PathBuf> = None;
    let mut bin_file_directory: Option<PathBuf> = None;
    let mut log_file_directory: Option<PathBuf> = None;
    let mut poll_file_directory: Option<PathBuf> = None;
    let mut work_file_directory: Option<PathBuf> = None;
    let mut send_failure_message = false;
    let mut alert_email_list = String::new();
    let mut exit_code_log_recovery = false;

    for raw_line in contents.lines() {
        let line = raw_line.trim();
        let Some((key, value)) = split_pair(line) else {
            continue;
        };

        match key {
            "ApplicationName" => application_name = Some(value.to_string()),
            "BatchName" => batch_name = Some(value.to_string()),
            "JobPollInterval" => job_poll_interval = parse_num(key, value)?,
            "MaxParallelJobs" => max_parallel_jobs = parse_num(key, value)?,
            "MaxArchivedLogs" => max_archived_logs = parse_num(key, value)?,
            "PerformAuditTableUpdates" => perform_audit_table_updates = parse_yn(value),
            "AuditTableUpdateInterval" => audit_table_update_interval = parse_num(key, value)?,
            "AuditTableCriticality" => audit_table_criticality = Criticality::parse(value)?,
            "BfConnectString" => bf_connect_string = value.to_string(),
            "BfUserId" => bf_user_id = value.to_string(),
            "BfUserPassword" => bf_user_password = value.to_string(),
            "BfBinFileDirectory" => bf_bin_file_directory = Some(as_path(value)),
            "BfLogFileDirectory" => bf_log_file_directory = Some(as_path(value)),
            "BfLockFileDirectory" => bf_lock_file_directory = Some(as_path(value)),
            "BinFileDirectory" => bin_file_directory = Some(as_path(value)),
            "LogFileDirectory" => log_file_directory = Some(as_path(value)),
            "PollFileDirectory" => poll_file_directory = Some(as_path(value)),
            "WorkFileDirectory" => work_file_directory = Some(as_path(value)),
            "SendFailureMessage" => send_failure_message = parse_yn(value),
            "AlertEMailList" => alert_email_list = value.to_string(),
            "ExitCodeLogRecovery" => exit_code_log_recovery = parse_yn(value),
            other => {
                debug!(key = other, "ignoring unknown config key");
            }
        }
    }

    Ok(BatchConfig {
        application_name: require_str("ApplicationName", application_name)?,
        batch_name: require_str("BatchName", batch_name)?,
        job_poll_interval,
        max_parallel_jobs,
        max_archived_logs,
        perform_audit_table_updates,
        audit_table_update_interval,
        audit_table_criticality,
        bf_connect_string,
        bf_user_id,
        bf_user_password,
        bf_bin_file_directory: require_dir("BfBinFileDirectory", bf_bin_file_directory)?,
        bf_log_file_directory: require_dir("BfLogFileDirectory", bf_log_file_directory)?,
        bf_lock_file_directory: require_dir("BfLockFileDirectory", bf_lock_file_directory)?,
        bin_file_directory: require_dir("BinFileDirectory", bin_file_directory)?,
        log_file_directory: require_dir("LogFileDirectory", log_file_directory)?,
        poll_file_directory: require_dir("PollFileDirectory", poll_file_directory)?,
        work_file_directory: require_dir("WorkFileDirectory", work_file_directory)?,
        send_failure_message,
        alert_email_list,
        exit_code_log_recovery,
        config_file: path.to_path_buf(),
    })
}

/// Split a `KEY=value` line, stripping matching surrounding double quotes
/// from the value. Returns `None` for blank lines, comments and anything
/// without an `=`.
fn split_pair(line: &str) -> Option<(&str, &str)> {
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let mut value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value = &value[1..value.len() - 1];
    }

    Some((key, value))
}
