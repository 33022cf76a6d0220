// src/recovery/last_success.rs

//! Resolver for the most recent successful batch.
//!
//! The three resolved values are exported into every launched job's
//! environment, letting incremental jobs pick up where the last good batch
//! left off.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::audit::files::parse_batch_audit_line;
use crate::audit::table::TableAuditor;
use crate::errors::Result;

/// Identity of the last successful batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastSuccess {
    pub batch_number: String,
    pub run_number: u32,
    pub process_date: String,
}

impl LastSuccess {
    /// Sentinel returned when no successful run is on record.
    pub fn sentinel() -> Self {
        Self {
            batch_number: "19000101000001".to_string(),
            run_number: 0,
            process_date: "1900-01-01 00:00:01".to_string(),
        }
    }
}

/// Resolve the last successful batch: from the audit table when available,
/// otherwise from the batch history file, falling back to the sentinel.
pub async fn resolve_last_success(
    table: Option<&TableAuditor>,
    batch_name: &str,
    history_file: &Path,
) -> Result<LastSuccess> {
    if let Some(auditor) = table {
        if let Some((batch_number, run_number, process_date)) =
            auditor.last_successful_batch(batch_name).await?
        {
            info!(
                batch_number = %batch_number,
                run_number,
                "last successful batch resolved from audit table"
            );
            return Ok(LastSuccess {
                batch_number,
                run_number,
                process_date,
            });
        }
        debug!("no successful batch on record in audit table");
        return Ok(LastSuccess::sentinel());
    }

    Ok(scan_history(batch_name, history_file))
}

/// Scan the history file for the latest SUCCESSFUL line of this batch.
fn scan_history(batch_name: &str, history_file: &Path) -> LastSuccess {
    let Ok(contents) = fs::read_to_string(history_file) else {
        debug!(
            path = %history_file.display(),
            "no batch history file; using sentinel last-success"
        );
        return LastSuccess::sentinel();
    };

    let mut latest: Option<LastSuccess> = None;
    for line in contents.lines() {
        let Some(row) = parse_batch_audit_line(line) else {
            continue;
        };
        if row.batch_name == batch_name && row.batch_status == "SUCCESSFUL" {
            latest = Some(LastSuccess {
                batch_number: row.batch_number,
                run_number: row.run_number,
                process_date: row.process_date,
            });
        }
    }

    match latest {
        Some(found) => {
            info!(
                batch_number = %found.batch_number,
                run_number = found.run_number,
                "last successful batch resolved from history file"
            );
            found
        }
        None => LastSuccess::sentinel(),
    }
}
