// tests/audit_files.rs

mod common;
use crate::common::builders::BatchEnv;
use crate::common::init_tracing;

use std::fs;

use batchdag::audit::files::{parse_batch_audit_line, read_process_audit, FileAudit};
use batchdag::proclist::loader::parse_process_list;
use batchdag::status::{BatchState, BatchStatus, BatchType, ProcessState, StatusStore};

fn sample_batch(status: BatchStatus) -> BatchState {
    BatchState {
        application_name: "TESTAPP".to_string(),
        batch_name: "NIGHTLY".to_string(),
        batch_alias: "NIGHTLY".to_string(),
        batch_number: "20260801230000".to_string(),
        run_number: 1,
        process_date: "2026-08-01 23:00:00".to_string(),
        batch_type: BatchType::Manual,
        status,
        start_time: "2026-08-01 23:00:01".to_string(),
        end_time: "2026-08-01 23:05:00".to_string(),
    }
}

fn sample_store() -> StatusStore {
    let list =
        parse_process_list("ProcessName, Predecessors\nextract,\nload, extract\n").unwrap();
    let mut store = StatusStore::from_list(&list);
    {
        let rec = store.get_mut("extract").unwrap();
        rec.state = ProcessState::Successful;
        rec.start_time = "2026-08-01 23:00:05".to_string();
        rec.end_time = "2026-08-01 23:01:00".to_string();
        rec.run_order = 1;
    }
    store
}

fn file_audit(env: &BatchEnv) -> FileAudit {
    FileAudit::new(
        env.batch_audit_path(),
        env.process_audit_path(),
        env.history_path(),
    )
}

#[test]
fn batch_audit_line_layout() {
    init_tracing();
    let env = BatchEnv::new("NIGHTLY");
    let audit = file_audit(&env);

    audit.write_batch(&sample_batch(BatchStatus::Successful)).unwrap();

    let line = env.read_batch_audit_line();
    assert_eq!(
        line,
        "20260801230000|1|NIGHTLY|2026-08-01 23:00:00|SUCCESSFUL|2026-08-01 23:00:01|2026-08-01 23:05:00|MANUAL|NIGHTLY"
    );
}

#[test]
fn end_time_is_blank_while_not_terminal() {
    init_tracing();
    let env = BatchEnv::new("NIGHTLY");
    let audit = file_audit(&env);

    audit.write_batch(&sample_batch(BatchStatus::Running)).unwrap();

    let line = env.read_batch_audit_line();
    let fields: Vec<&str> = line.split('|').collect();
    assert_eq!(fields[4], "RUNNING");
    assert_eq!(fields[6], "", "end time must stay blank until terminal");
}

#[test]
fn batch_audit_is_overwritten_not_appended() {
    init_tracing();
    let env = BatchEnv::new("NIGHTLY");
    let audit = file_audit(&env);

    audit.write_batch(&sample_batch(BatchStatus::Running)).unwrap();
    audit.write_batch(&sample_batch(BatchStatus::Successful)).unwrap();

    let contents = fs::read_to_string(env.batch_audit_path()).unwrap();
    assert_eq!(contents.lines().count(), 1);
}

#[test]
fn process_audit_round_trips() {
    init_tracing();
    let env = BatchEnv::new("NIGHTLY");
    let audit = file_audit(&env);
    let batch = sample_batch(BatchStatus::Running);
    let store = sample_store();

    audit.write_processes(&batch, &store).unwrap();
    let rows = read_process_audit(env.process_audit_path()).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].process_name, "extract");
    assert_eq!(rows[0].status, ProcessState::Successful);
    assert_eq!(rows[0].start_time, "2026-08-01 23:00:05");
    assert_eq!(rows[0].end_time, "2026-08-01 23:01:00");
    assert_eq!(rows[1].process_name, "load");
    assert_eq!(rows[1].status, ProcessState::Waiting);
    assert_eq!(rows[1].start_time, "");
    assert_eq!(rows[1].run_number, 1);
    assert_eq!(rows[0].batch_number, "20260801230000");
}

#[test]
fn history_appends_the_batch_audit_line_verbatim() {
    init_tracing();
    let env = BatchEnv::new("NIGHTLY");
    let audit = file_audit(&env);

    audit.write_batch(&sample_batch(BatchStatus::Failed)).unwrap();
    audit.append_history().unwrap();
    audit.write_batch(&sample_batch(BatchStatus::Successful)).unwrap();
    audit.append_history().unwrap();

    let history = fs::read_to_string(env.history_path()).unwrap();
    let lines: Vec<&str> = history.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("|FAILED|"));
    assert!(lines[1].contains("|SUCCESSFUL|"));
    assert_eq!(lines[1], env.read_batch_audit_line());
}

#[test]
fn batch_audit_line_parses_back() {
    init_tracing();
    let env = BatchEnv::new("NIGHTLY");
    let audit = file_audit(&env);
    audit.write_batch(&sample_batch(BatchStatus::Successful)).unwrap();

    let row = parse_batch_audit_line(&env.read_batch_audit_line()).expect("line should parse");
    assert_eq!(row.batch_number, "20260801230000");
    assert_eq!(row.run_number, 1);
    assert_eq!(row.batch_name, "NIGHTLY");
    assert_eq!(row.batch_status, "SUCCESSFUL");
    assert_eq!(row.batch_type, "MANUAL");
}

#[test]
fn missing_process_audit_reads_as_empty() {
    init_tracing();
    let env = BatchEnv::new("NIGHTLY");
    let rows = read_process_audit(env.process_audit_path()).unwrap();
    assert!(rows.is_empty());
}
