// tests/exit_recovery.rs

//! Anomalous exit-status handling: signal-killed jobs, with and without the
//! log-tail recovery heuristic.

mod common;
use crate::common::builders::{bootstrap, BatchEnv};
use crate::common::init_tracing;

use tokio::time::{timeout, Duration};

use batchdag::engine::{BatchRequest, ExitCode};
use batchdag::status::ProcessState;

const HEADER: &str = "ProcessName, Predecessors\n";

#[tokio::test]
async fn signal_death_is_a_failure_by_default() {
    init_tracing();
    let env = BatchEnv::new("SIGKILLED");
    env.write_proc_file(&format!("{HEADER}a,\n"));
    // The job reports success in its log, then dies without an exit code.
    env.write_script("a", "echo \"status: 0\"\nkill -9 $$");

    let engine = bootstrap(&env, BatchRequest::default()).await;
    let exit = timeout(Duration::from_secs(10), engine.run())
        .await
        .expect("engine timed out")
        .expect("engine error");
    assert_eq!(exit, ExitCode::JobFailed);

    let rows = env.read_process_audit();
    assert_eq!(rows[0].status, ProcessState::Failed);
}

#[tokio::test]
async fn log_tail_recovery_rescues_a_reported_success() {
    init_tracing();
    let env = BatchEnv::with_overrides("RECOVERED", &[("ExitCodeLogRecovery", "Y")]);
    env.write_proc_file(&format!("{HEADER}a,\n"));
    env.write_script("a", "echo \"status: 0\"\nkill -9 $$");

    let engine = bootstrap(&env, BatchRequest::default()).await;
    let exit = timeout(Duration::from_secs(10), engine.run())
        .await
        .expect("engine timed out")
        .expect("engine error");
    assert_eq!(exit, ExitCode::Success);

    let rows = env.read_process_audit();
    assert_eq!(rows[0].status, ProcessState::Successful);
}

#[tokio::test]
async fn log_tail_recovery_keeps_a_reported_failure() {
    init_tracing();
    let env = BatchEnv::with_overrides("STILLBAD", &[("ExitCodeLogRecovery", "Y")]);
    env.write_proc_file(&format!("{HEADER}a,\n"));
    env.write_script("a", "echo \"status: 7\"\nkill -9 $$");

    let engine = bootstrap(&env, BatchRequest::default()).await;
    let exit = timeout(Duration::from_secs(10), engine.run())
        .await
        .expect("engine timed out")
        .expect("engine error");
    assert_eq!(exit, ExitCode::JobFailed);

    let rows = env.read_process_audit();
    assert_eq!(rows[0].status, ProcessState::Failed);
}
