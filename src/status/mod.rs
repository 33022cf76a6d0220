// src/status/mod.rs

//! In-memory run state: per-process records, batch-level state, and the
//! aggregate counts the scheduler's termination decision is based on.

use std::collections::HashMap;

use crate::errors::{BatchError, Result};
use crate::exec::JobHandle;
use crate::proclist::ProcessList;

/// Lifecycle of one process within a batch run.
///
/// Transitions are confined to `WAITING -> RUNNING -> {SUCCESSFUL, FAILED}`;
/// the serialized tokens appear verbatim in audit files and the relational
/// store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Waiting,
    Running,
    Successful,
    Failed,
}

impl ProcessState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Waiting => "WAITING",
            ProcessState::Running => "RUNNING",
            ProcessState::Successful => "SUCCESSFUL",
            ProcessState::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "WAITING" => Ok(ProcessState::Waiting),
            "RUNNING" => Ok(ProcessState::Running),
            "SUCCESSFUL" => Ok(ProcessState::Successful),
            "FAILED" => Ok(ProcessState::Failed),
            other => Err(BatchError::Audit(format!(
                "unknown process status '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall batch status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Running,
    Waiting,
    Successful,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Running => "RUNNING",
            BatchStatus::Waiting => "WAITING",
            BatchStatus::Successful => "SUCCESSFUL",
            BatchStatus::Failed => "FAILED",
        }
    }

    /// Terminal states carry an end time in the batch audit line.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Successful | BatchStatus::Failed)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the batch was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchType {
    Auto,
    Manual,
    Test,
}

impl BatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchType::Auto => "AUTO",
            BatchType::Manual => "MANUAL",
            BatchType::Test => "TEST",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "AUTO" => Ok(BatchType::Auto),
            "MANUAL" => Ok(BatchType::Manual),
            "TEST" => Ok(BatchType::Test),
            other => Err(BatchError::Config(format!(
                "batch type must be AUTO or MANUAL (got '{other}')"
            ))),
        }
    }
}

impl std::fmt::Display for BatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Batch-level identity and run state.
#[derive(Debug, Clone)]
pub struct BatchState {
    pub application_name: String,
    pub batch_name: String,
    pub batch_alias: String,
    /// 14-digit `YYYYMMDDHH24MISS` identifier.
    pub batch_number: String,
    pub run_number: u32,
    pub process_date: String,
    pub batch_type: BatchType,
    pub status: BatchStatus,
    pub start_time: String,
    pub end_time: String,
}

/// Per-process record. Exactly one exists per active process at all times.
#[derive(Debug)]
pub struct ProcessRecord {
    pub name: String,
    /// 1-based; incremented for processes re-run by resurrection.
    pub run_number: u32,
    /// Index in the parsed process list.
    pub natural_order: u32,
    /// 0 until launched, then assigned from a monotonic launch counter.
    pub run_order: u32,
    pub pid: Option<u32>,
    pub state: ProcessState,
    /// Wall-clock strings; empty until set.
    pub start_time: String,
    pub end_time: String,
    /// Live child handle (or synthetic counter) while RUNNING.
    pub handle: Option<JobHandle>,
}

impl ProcessRecord {
    fn fresh(name: String, natural_order: u32) -> Self {
        Self {
            name,
            run_number: 1,
            natural_order,
            run_order: 0,
            pid: None,
            state: ProcessState::Waiting,
            start_time: String::new(),
            end_time: String::new(),
            handle: None,
        }
    }
}

/// Aggregate counts over the store, recomputed once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregates {
    pub running: usize,
    pub waiting: usize,
    pub failed: usize,
}

/// All process records for the batch, in process-list order, with a name
/// index for O(1) lookup.
#[derive(Debug)]
pub struct StatusStore {
    records: Vec<ProcessRecord>,
    index: HashMap<String, usize>,
}

impl StatusStore {
    /// One fresh WAITING record per active process, list order preserved.
    pub fn from_list(list: &ProcessList) -> Self {
        let mut records = Vec::with_capacity(list.entries.len());
        let mut index = HashMap::with_capacity(list.entries.len());

        for (i, entry) in list.entries.iter().enumerate() {
            index.insert(entry.name.clone(), records.len());
            records.push(ProcessRecord::fresh(entry.name.clone(), i as u32));
        }

        Self { records, index }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ProcessRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ProcessRecord> {
        let i = *self.index.get(name)?;
        Some(&mut self.records[i])
    }

    /// Records in process-list order.
    pub fn iter(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProcessRecord> {
        self.records.iter_mut()
    }

    /// Names in process-list order (cloned so the caller can mutate records
    /// while walking them).
    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }

    pub fn state_of(&self, name: &str) -> Option<ProcessState> {
        self.get(name).map(|r| r.state)
    }

    pub fn any_failed(&self) -> bool {
        self.records
            .iter()
            .any(|r| r.state == ProcessState::Failed)
    }

    pub fn aggregates(&self) -> Aggregates {
        let mut agg = Aggregates {
            running: 0,
            waiting: 0,
            failed: 0,
        };
        for r in &self.records {
            match r.state {
                ProcessState::Running => agg.running += 1,
                ProcessState::Waiting => agg.waiting += 1,
                ProcessState::Failed => agg.failed += 1,
                ProcessState::Successful => {}
            }
        }
        agg
    }

    /// Highest `run_order` assigned so far (0 when nothing has launched).
    pub fn max_run_order(&self) -> u32 {
        self.records.iter().map(|r| r.run_order).max().unwrap_or(0)
    }
}
