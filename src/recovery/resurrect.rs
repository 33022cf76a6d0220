// src/recovery/resurrect.rs

//! Resurrection planning: resume a partially failed batch from its last
//! process-audit file.
//!
//! The planner is a pure function over the parsed audit rows; applying the
//! plan to a status store is the engine's job. If every recorded process
//! succeeded, the last run needs no resurrection and the planner declines,
//! letting a fresh batch start.

use tracing::info;

use crate::audit::files::ProcessAuditRow;
use crate::status::ProcessState;

/// Seed state for one process carried over from the previous run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededProcess {
    pub name: String,
    pub run_number: u32,
    pub run_order: u32,
    pub state: ProcessState,
    pub start_time: String,
    pub end_time: String,
}

/// The decision produced by [`plan_resurrection`].
#[derive(Debug, Clone)]
pub struct ResurrectionPlan {
    /// The original batch number is reused.
    pub batch_number: String,
    /// New batch run number: `max(run_number in the audit file) + 1`.
    pub run_number: u32,
    /// One seed per audited process, file order preserved.
    pub seeded: Vec<SeededProcess>,
}

/// Build a resurrection plan from the previous run's process audit rows.
///
/// Returns `None` when there is nothing to resurrect: no audit rows at all,
/// or every recorded process ended SUCCESSFUL (the LastRunSucceeded short
/// circuit).
pub fn plan_resurrection(rows: &[ProcessAuditRow]) -> Option<ResurrectionPlan> {
    if rows.is_empty() {
        return None;
    }

    if rows.iter().all(|r| r.status == ProcessState::Successful) {
        info!("last run succeeded for every process; resurrection not required");
        return None;
    }

    let batch_number = rows[0].batch_number.clone();
    let run_number = rows.iter().map(|r| r.run_number).max().unwrap_or(0) + 1;

    let seeded = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            if row.status == ProcessState::Successful {
                // Completed work is carried over untouched; run order
                // reflects the position in the audit file.
                SeededProcess {
                    name: row.process_name.clone(),
                    run_number: row.run_number,
                    run_order: (i + 1) as u32,
                    state: ProcessState::Successful,
                    start_time: row.start_time.clone(),
                    end_time: row.end_time.clone(),
                }
            } else {
                // RUNNING, WAITING and FAILED all re-run from scratch under
                // the new run number.
                SeededProcess {
                    name: row.process_name.clone(),
                    run_number,
                    run_order: 0,
                    state: ProcessState::Waiting,
                    start_time: String::new(),
                    end_time: String::new(),
                }
            }
        })
        .collect();

    info!(
        batch_number = %batch_number,
        run_number,
        "resurrection plan built from previous process audit"
    );

    Some(ResurrectionPlan {
        batch_number,
        run_number,
        seeded,
    })
}
