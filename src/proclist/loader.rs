// src/proclist/loader.rs

//! Parser for the `<BatchName>.proc` process list file.
//!
//! The file is CSV-like: a one-line header (skipped), then one process per
//! line with `process_name, predecessors` where the predecessors field is a
//! whitespace-separated list of names. Comment conventions:
//!
//! - `#--` lines are descriptive comments, discarded entirely;
//! - other `#`-prefixed lines are commented-out processes: the name is
//!   remembered so downstream predecessor references to it can be pruned,
//!   but the process is not part of the active list.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::errors::{BatchError, Result};

/// One active process line: a name and its predecessor names.
#[derive(Debug, Clone)]
pub struct ProcessEntry {
    pub name: String,
    pub predecessors: Vec<String>,
}

/// The parsed process list: active entries in file order, plus the set of
/// commented-out names used for predecessor pruning.
#[derive(Debug, Clone)]
pub struct ProcessList {
    pub entries: Vec<ProcessEntry>,
    pub commented_out: HashSet<String>,
}

impl ProcessList {
    /// Whether `name` is an active process.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Active process names in list order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
}

/// Load and parse a process list file.
///
/// Fails if the file is unreadable, contains no active processes, or names
/// the same active process twice.
pub fn load_process_list(path: impl AsRef<Path>) -> Result<ProcessList> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        BatchError::ProcessList(format!(
            "cannot read process list {}: {e}",
            path.display()
        ))
    })?;

    let list = parse_process_list(&contents)?;
    debug!(
        path = %path.display(),
        active = list.entries.len(),
        commented_out = list.commented_out.len(),
        "process list loaded"
    );
    Ok(list)
}

/// Parse process list text. Split from [`load_process_list`] so tests can
/// feed strings directly.
pub fn parse_process_list(contents: &str) -> Result<ProcessList> {
    let mut entries: Vec<ProcessEntry> = Vec::new();
    let mut commented_out: HashSet<String> = HashSet::new();
    let mut seen: HashSet<String> = HashSet::new();

    // The first line is a header and carries no process.
    for raw_line in contents.lines().skip(1) {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("#--") {
            continue;
        }

        if let Some(rest) = line.strip_prefix('#') {
            // Commented-out process: remember the name, drop the entry.
            if let Some(name) = first_field(rest) {
                commented_out.insert(name);
            }
            continue;
        }

        let mut fields = line.splitn(3, ',');
        let name = match fields.next().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => continue,
        };
        let predecessors: Vec<String> = fields
            .next()
            .unwrap_or("")
            .split_whitespace()
            .map(str::to_string)
            .collect();

        if !seen.insert(name.clone()) {
            return Err(BatchError::ProcessList(format!(
                "duplicate process name '{name}' in process list"
            )));
        }

        entries.push(ProcessEntry { name, predecessors });
    }

    if entries.is_empty() {
        return Err(BatchError::ProcessList(
            "process list contains no active processes".to_string(),
        ));
    }

    // Prune predecessors that name a commented-out process and are not
    // themselves active. This lets authors comment out a node without
    // editing every downstream reference.
    let active: HashSet<String> = entries.iter().map(|e| e.name.clone()).collect();
    for entry in &mut entries {
        entry.predecessors.retain(|p| {
            let pruned = commented_out.contains(p) && !active.contains(p);
            if pruned {
                debug!(
                    process = %entry.name,
                    predecessor = %p,
                    "pruning predecessor referencing commented-out process"
                );
            }
            !pruned
        });
    }

    Ok(ProcessList {
        entries,
        commented_out,
    })
}

/// First comma-separated field of a line, trimmed; `None` when empty.
fn first_field(line: &str) -> Option<String> {
    let name = line.split(',').next()?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
