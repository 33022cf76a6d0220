// src/alert.rs

//! Failure alerting.
//!
//! Alert dispatch is an external collaborator: the engine only carries the
//! contract (subject, fixed body, job log attached) behind [`AlertSender`].
//! The production implementation shells out to the system `mailx`; a failed
//! alert is a warning, never a batch failure.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use std::io::Write;

use tracing::{info, warn};

use crate::errors::Result;

/// What a failure alert is about.
#[derive(Debug, Clone)]
pub struct AlertContext {
    pub process_name: String,
    pub application_name: String,
    pub batch_name: String,
    pub job_path: PathBuf,
    pub log_path: PathBuf,
    /// Comma- or space-separated recipient list.
    pub recipients: String,
}

/// Dispatch seam for failure alerts.
pub trait AlertSender: Send {
    fn send_failure_alert(&mut self, ctx: &AlertContext) -> Result<()>;
}

/// Sends mail through the system `mailx` binary, attaching the job log.
pub struct SystemMailer;

impl AlertSender for SystemMailer {
    fn send_failure_alert(&mut self, ctx: &AlertContext) -> Result<()> {
        let subject = format!("[ALERT] {} failed", ctx.process_name);
        let body = alert_body(ctx);

        let recipients: Vec<&str> = ctx
            .recipients
            .split([',', ' '])
            .filter(|r| !r.is_empty())
            .collect();

        let mut cmd = Command::new("mailx");
        cmd.arg("-s").arg(&subject);
        if ctx.log_path.exists() {
            cmd.arg("-a").arg(&ctx.log_path);
        }
        cmd.args(&recipients)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let spawned = cmd.spawn().and_then(|mut child| {
            if let Some(stdin) = child.stdin.as_mut() {
                stdin.write_all(body.as_bytes())?;
            }
            child.wait()
        });

        match spawned {
            Ok(status) if status.success() => {
                info!(process = %ctx.process_name, "failure alert sent");
            }
            Ok(status) => {
                warn!(
                    process = %ctx.process_name,
                    code = status.code(),
                    "mailx exited non-zero; alert may not have been sent"
                );
            }
            Err(e) => {
                warn!(process = %ctx.process_name, error = %e, "cannot invoke mailx");
            }
        }

        Ok(())
    }
}

/// No-op sender used when `SendFailureMessage=N` or the recipient list is
/// empty.
pub struct NoAlerts;

impl AlertSender for NoAlerts {
    fn send_failure_alert(&mut self, _ctx: &AlertContext) -> Result<()> {
        Ok(())
    }
}

fn alert_body(ctx: &AlertContext) -> String {
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
    format!(
        "Application: {}\n\
         Batch:       {}\n\
         User:        {}\n\
         Host:        {}\n\
         Job:         {}\n\
         Log:         {}\n",
        ctx.application_name,
        ctx.batch_name,
        user,
        host,
        display(&ctx.job_path),
        display(&ctx.log_path),
    )
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
