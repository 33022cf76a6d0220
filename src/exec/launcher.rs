// src/exec/launcher.rs

//! Production job launcher: spawns external programs with stdout and stderr
//! redirected into the per-job log, and normalizes their exit status.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::Stdio;

use regex::Regex;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{BatchError, Result};
use crate::exec::{JobHandle, JobKind, JobLauncher, JobOutcome, JobPoll, JobSpec};

/// How far back in the job log the exit-status recovery scans.
const LOG_TAIL_BYTES: u64 = 256;

/// Launches `<program> <config_file>` with output captured to the job log.
///
/// When `log_recovery` is on, an anomalous exit status (killed by signal, or
/// a reported `-1`) is recovered from a trailing `status: <int>` line in the
/// job log; otherwise anomalous statuses are failures.
pub struct ProcessLauncher {
    log_recovery: bool,
    status_pattern: Regex,
}

impl ProcessLauncher {
    pub fn new(log_recovery: bool) -> Self {
        Self {
            log_recovery,
            // Anchored loosely: the last `status: <int>` in the tail wins.
            status_pattern: Regex::new(r"status:\s*(-?\d+)").expect("static pattern"),
        }
    }
}

impl JobLauncher for ProcessLauncher {
    fn launch(&mut self, spec: &JobSpec) -> Result<JobHandle> {
        if spec.kind == JobKind::Synthetic {
            debug!(process = %spec.name, "synthetic launch (milestone or test mode)");
            return Ok(JobHandle::Synthetic { polls: 0 });
        }

        let log = File::create(&spec.log_file).map_err(|e| {
            BatchError::JobControl(format!(
                "cannot create job log {}: {e}",
                spec.log_file.display()
            ))
        })?;
        let log_err = log.try_clone().map_err(BatchError::Io)?;

        let mut cmd = Command::new(&spec.program);
        cmd.arg(&spec.config_file)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            // The engine never kills running jobs; STOP only suppresses
            // further launches.
            .kill_on_drop(false);

        let child = cmd.spawn().map_err(|e| {
            BatchError::JobControl(format!(
                "cannot spawn '{} {}': {e}",
                spec.program.display(),
                spec.config_file.display()
            ))
        })?;

        info!(
            process = %spec.name,
            pid = child.id(),
            program = %spec.program.display(),
            "job process started"
        );

        Ok(JobHandle::Child {
            child,
            log_file: spec.log_file.clone(),
        })
    }

    fn poll(&mut self, name: &str, handle: &mut JobHandle) -> Result<JobPoll> {
        match handle {
            JobHandle::Synthetic { polls } => {
                *polls += 1;
                if *polls > 1 {
                    Ok(JobPoll::Done(JobOutcome::Success))
                } else {
                    Ok(JobPoll::Running)
                }
            }
            JobHandle::Child { child, log_file } => {
                let status = child.try_wait().map_err(|e| {
                    BatchError::JobControl(format!("cannot poll process '{name}': {e}"))
                })?;

                let Some(status) = status else {
                    return Ok(JobPoll::Running);
                };

                let outcome = match status.code() {
                    Some(0) => JobOutcome::Success,
                    Some(code) if code != -1 => JobOutcome::Failed(code),
                    // No code (killed by signal) or a legacy -1: anomalous.
                    anomalous => {
                        if self.log_recovery {
                            let recovered = recover_from_log(log_file, &self.status_pattern);
                            info!(
                                process = %name,
                                reported = ?anomalous,
                                recovered = ?recovered,
                                "anomalous exit status recovered from job log tail"
                            );
                            recovered
                        } else {
                            warn!(
                                process = %name,
                                reported = ?anomalous,
                                "anomalous exit status treated as failure"
                            );
                            JobOutcome::Failed(-1)
                        }
                    }
                };

                Ok(JobPoll::Done(outcome))
            }
        }
    }
}

/// Scan the tail of the job log for the last `status: <int>` occurrence.
/// `0` means success; anything else (or no match) is the reported failure.
fn recover_from_log(log_file: &Path, pattern: &Regex) -> JobOutcome {
    let tail = match read_tail(log_file, LOG_TAIL_BYTES) {
        Ok(t) => t,
        Err(e) => {
            warn!(log = %log_file.display(), error = %e, "cannot read job log tail");
            return JobOutcome::Failed(-1);
        }
    };

    let code = pattern
        .captures_iter(&tail)
        .last()
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok());

    match code {
        Some(0) => JobOutcome::Success,
        Some(n) => JobOutcome::Failed(n),
        None => JobOutcome::Failed(-1),
    }
}

fn read_tail(path: &Path, max_bytes: u64) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let start = len.saturating_sub(max_bytes);
    file.seek(SeekFrom::Start(start))?;

    let mut buf = Vec::with_capacity(max_bytes as usize);
    file.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
