// src/audit/mod.rs

//! Audit persistence: flat files (always) and the relational store
//! (optional, behind the criticality gate).
//!
//! - [`files`] owns the pipe-delimited batch/process audit files and the
//!   append-only history; the matching readers feed resurrection and the
//!   last-success resolver.
//! - [`table`] performs the `etl_batch_audit` / `etl_process_audit` upserts
//!   and the heartbeat.
//! - [`gate`] wraps the table auditor with the update-interval throttle and
//!   the WARN/ERROR criticality latch.

pub mod files;
pub mod gate;
pub mod table;

pub use files::{
    parse_batch_audit_line, read_process_audit, BatchAuditRow, FileAudit, ProcessAuditRow,
};
pub use gate::AuditGate;
pub use table::TableAuditor;
