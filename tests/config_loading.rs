// tests/config_loading.rs

mod common;
use crate::common::init_tracing;

use std::fs;

use tempfile::TempDir;

use batchdag::config::{load_and_validate, load_from_path, Criticality};
use batchdag::errors::BatchError;

fn write_config(dir: &TempDir, extra: &str) -> std::path::PathBuf {
    let base = format!(
        "ApplicationName=TESTAPP\n\
         BatchName=\"NIGHTLY\"\n\
         BfBinFileDirectory=/opt/batch/bin\n\
         BfLogFileDirectory=\"/opt/batch/log\"\n\
         BfLockFileDirectory=/opt/batch/lock\n\
         BinFileDirectory=/opt/app/bin\n\
         LogFileDirectory=/opt/app/log\n\
         PollFileDirectory=/opt/app/poll\n\
         WorkFileDirectory=/opt/app/work\n\
         {extra}"
    );
    let path = dir.path().join("batch.cfg");
    fs::write(&path, base).expect("write config");
    path
}

#[test]
fn parses_keys_and_strips_quotes() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "JobPollInterval=5\nMaxParallelJobs=4\nAuditTableCriticality=ERROR\nSendFailureMessage=Y\n",
    );

    let cfg = load_from_path(&path).expect("config should load");

    assert_eq!(cfg.application_name, "TESTAPP");
    assert_eq!(cfg.batch_name, "NIGHTLY");
    assert_eq!(cfg.job_poll_interval, 5);
    assert_eq!(cfg.max_parallel_jobs, 4);
    assert_eq!(cfg.audit_table_criticality, Criticality::Error);
    assert!(cfg.send_failure_message);
    // Quoted values come back without quotes.
    assert_eq!(
        cfg.bf_log_file_directory.display().to_string(),
        "/opt/batch/log"
    );
}

#[test]
fn applies_defaults() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let cfg = load_from_path(&path).expect("config should load");

    assert_eq!(cfg.job_poll_interval, 2);
    assert_eq!(cfg.max_parallel_jobs, 0);
    assert_eq!(cfg.max_archived_logs, 3);
    assert!(!cfg.perform_audit_table_updates);
    assert_eq!(cfg.audit_table_criticality, Criticality::Warn);
    assert!(!cfg.send_failure_message);
    assert!(!cfg.exit_code_log_recovery);
}

#[test]
fn ignores_unknown_keys() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "SomeLegacyKnob=42\nAnotherOne=\"yes\"\n");

    assert!(load_from_path(&path).is_ok());
}

#[test]
fn missing_mandatory_key_is_an_error() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("batch.cfg");
    fs::write(&path, "ApplicationName=TESTAPP\nBatchName=NIGHTLY\n").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, BatchError::Config(_)), "got: {err}");
}

#[test]
fn unreadable_file_is_an_error() {
    init_tracing();
    let err = load_from_path("/nonexistent/batch.cfg").unwrap_err();
    assert!(matches!(err, BatchError::Config(_)));
}

#[test]
fn audit_interval_below_poll_interval_is_rejected() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "JobPollInterval=10\nPerformAuditTableUpdates=Y\nAuditTableUpdateInterval=5\n\
         BfConnectString=db.example.com/etl\n",
    );

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, BatchError::Config(_)), "got: {err}");
}

#[test]
fn zero_poll_interval_is_rejected() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "JobPollInterval=0\n");

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, BatchError::Config(_)));
}

#[test]
fn criticality_must_be_warn_or_error() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "AuditTableCriticality=SOMETIMES\n");

    assert!(load_from_path(&path).is_err());
}
