// tests/resurrection.rs

//! Resurrection: resuming a partially failed batch from its process audit.

mod common;
use crate::common::builders::{bootstrap, BatchEnv};
use crate::common::init_tracing;

use std::fs;

use tokio::time::{timeout, Duration};

use batchdag::audit::files::ProcessAuditRow;
use batchdag::engine::{BatchRequest, ExitCode};
use batchdag::recovery::plan_resurrection;
use batchdag::status::ProcessState;

const HEADER: &str = "ProcessName, Predecessors\n";

fn row(
    batch_number: &str,
    run_number: u32,
    name: &str,
    status: ProcessState,
    start: &str,
    end: &str,
) -> ProcessAuditRow {
    ProcessAuditRow {
        batch_number: batch_number.to_string(),
        run_number,
        process_name: name.to_string(),
        status,
        start_time: start.to_string(),
        end_time: end.to_string(),
    }
}

#[test]
fn planner_reruns_only_unsuccessful_processes() {
    init_tracing();
    let rows = vec![
        row("20260801120000", 1, "a", ProcessState::Successful, "s1", "e1"),
        row("20260801120000", 1, "b", ProcessState::Failed, "s2", "e2"),
        row("20260801120000", 1, "c", ProcessState::Waiting, "", ""),
    ];

    let plan = plan_resurrection(&rows).expect("plan expected");

    assert_eq!(plan.batch_number, "20260801120000");
    assert_eq!(plan.run_number, 2);

    let a = &plan.seeded[0];
    assert_eq!(a.state, ProcessState::Successful);
    assert_eq!(a.run_number, 1);
    assert_eq!(a.run_order, 1);
    assert_eq!(a.start_time, "s1");
    assert_eq!(a.end_time, "e1");

    for seed in &plan.seeded[1..] {
        assert_eq!(seed.state, ProcessState::Waiting);
        assert_eq!(seed.run_number, 2);
        assert_eq!(seed.run_order, 0);
        assert!(seed.start_time.is_empty() && seed.end_time.is_empty());
    }
}

#[test]
fn planner_declines_when_last_run_succeeded() {
    init_tracing();
    let rows = vec![
        row("20260801120000", 1, "a", ProcessState::Successful, "s1", "e1"),
        row("20260801120000", 1, "b", ProcessState::Successful, "s2", "e2"),
    ];

    assert!(plan_resurrection(&rows).is_none());
}

#[test]
fn planner_declines_without_audit_rows() {
    init_tracing();
    assert!(plan_resurrection(&[]).is_none());
}

#[test]
fn planner_uses_highest_recorded_run_number() {
    init_tracing();
    // A second resurrection: the failed process already carries run 2.
    let rows = vec![
        row("20260801120000", 1, "a", ProcessState::Successful, "s1", "e1"),
        row("20260801120000", 2, "b", ProcessState::Failed, "s2", "e2"),
    ];

    let plan = plan_resurrection(&rows).expect("plan expected");
    assert_eq!(plan.run_number, 3);
}

#[tokio::test]
async fn resurrected_batch_reuses_number_and_skips_successful_work() {
    init_tracing();
    let env = BatchEnv::new("RESUME");
    env.write_proc_file(&format!("{HEADER}a,\nb, a\nc, b\n"));

    // Previous run: a succeeded, b failed, c never started.
    fs::write(
        env.process_audit_path(),
        "20260801120000|1|a|SUCCESSFUL|2026-08-01 12:00:05|2026-08-01 12:01:00\n\
         20260801120000|1|b|FAILED|2026-08-01 12:01:05|2026-08-01 12:02:00\n\
         20260801120000|1|c|WAITING||\n",
    )
    .unwrap();

    // a must NOT run again: its script would fail the batch if launched.
    env.write_script("a", "exit 1");
    env.write_script("b", "exit 0");
    env.write_script("c", "exit 0");

    let request = BatchRequest {
        resurrect: true,
        ..BatchRequest::default()
    };
    let engine = bootstrap(&env, request).await;
    let exit = timeout(Duration::from_secs(10), engine.run())
        .await
        .expect("engine timed out")
        .expect("engine error");
    assert_eq!(exit, ExitCode::Success);

    let rows = env.read_process_audit();
    let by_name = |n: &str| rows.iter().find(|r| r.process_name == n).unwrap();

    // Batch number unchanged throughout.
    assert!(rows.iter().all(|r| r.batch_number == "20260801120000"));

    // a carries its original run number and timings.
    let a = by_name("a");
    assert_eq!(a.run_number, 1);
    assert_eq!(a.status, ProcessState::Successful);
    assert_eq!(a.start_time, "2026-08-01 12:00:05");
    assert_eq!(a.end_time, "2026-08-01 12:01:00");

    // b and c re-ran under run number 2 with fresh timings.
    for name in ["b", "c"] {
        let r = by_name(name);
        assert_eq!(r.run_number, 2);
        assert_eq!(r.status, ProcessState::Successful);
        assert_ne!(r.start_time, "2026-08-01 12:01:05");
    }

    // The batch audit line reports the resurrected run.
    let line = env.read_batch_audit_line();
    assert!(line.starts_with("20260801120000|2|"), "got: {line}");
}

#[tokio::test]
async fn res_flag_file_requests_resurrection() {
    init_tracing();
    let env = BatchEnv::new("RESFLAG");
    env.write_proc_file(&format!("{HEADER}a,\n"));

    fs::write(
        env.process_audit_path(),
        "20260801130000|1|a|FAILED|2026-08-01 13:00:05|2026-08-01 13:01:00\n",
    )
    .unwrap();
    env.write_script("a", "exit 0");
    env.drop_flag("RES.flg");

    let engine = bootstrap(&env, BatchRequest::default()).await;
    let exit = timeout(Duration::from_secs(10), engine.run())
        .await
        .expect("engine timed out")
        .expect("engine error");
    assert_eq!(exit, ExitCode::Success);

    let rows = env.read_process_audit();
    assert_eq!(rows[0].batch_number, "20260801130000");
    assert_eq!(rows[0].run_number, 2);
}

#[tokio::test]
async fn resurrection_of_a_clean_run_starts_a_fresh_batch() {
    init_tracing();
    let env = BatchEnv::new("CLEAN");
    env.write_proc_file(&format!("{HEADER}a,\n"));

    fs::write(
        env.process_audit_path(),
        "20260801140000|1|a|SUCCESSFUL|2026-08-01 14:00:05|2026-08-01 14:01:00\n",
    )
    .unwrap();
    // This time a really runs again.
    env.write_script("a", "exit 0");

    let request = BatchRequest {
        resurrect: true,
        ..BatchRequest::default()
    };
    let engine = bootstrap(&env, request).await;
    let exit = timeout(Duration::from_secs(10), engine.run())
        .await
        .expect("engine timed out")
        .expect("engine error");
    assert_eq!(exit, ExitCode::Success);

    let rows = env.read_process_audit();
    // Fresh batch: new number, run number back to 1.
    assert_ne!(rows[0].batch_number, "20260801140000");
    assert_eq!(rows[0].run_number, 1);
}
