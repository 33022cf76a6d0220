// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! The short options mirror the operator surface batch schedulers already
//! script against (`-a`, `-b`, `-r`, ...), so values may be attached
//! (`-aNIGHTLY`) or separated (`-a NIGHTLY`).

use std::path::PathBuf;

use clap::Parser;
use tracing::debug;

use crate::engine::BatchRequest;
use crate::errors::{BatchError, Result};
use crate::status::BatchType;

/// Command-line arguments for `batchdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "batchdag",
    version,
    about = "Run a batch of external jobs in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the batch configuration file (flat KEY=value).
    #[arg(value_name = "CONFIG_FILE")]
    pub config: PathBuf,

    /// Batch alias (no spaces); defaults to the batch name.
    #[arg(short = 'a', value_name = "ALIAS")]
    pub alias: Option<String>,

    /// Explicit batch number (YYYYMMDDHH24MISS); otherwise allocated.
    #[arg(short = 'b', value_name = "NUMBER")]
    pub batch_number: Option<String>,

    /// Starting milestone bound (accepted; launching is not pre-filtered).
    #[arg(short = 's', value_name = "N")]
    pub start_milestone: Option<u32>,

    /// Ending milestone bound (accepted; launching is not pre-filtered).
    #[arg(short = 'e', value_name = "N")]
    pub end_milestone: Option<u32>,

    /// Debug logging.
    #[arg(short = 'd')]
    pub debug: bool,

    /// Resurrect the previous failed run of this batch.
    #[arg(short = 'r')]
    pub resurrect: bool,

    /// Process date (YYYY-MM-DD HH:MM:SS); defaults to now.
    #[arg(short = 'p', value_name = "DATE")]
    pub process_date: Option<String>,

    /// Batch type: AUTO or MANUAL. Defaults to AUTO under RUN_BY_CRON=TRUE.
    #[arg(short = 't', value_name = "TYPE")]
    pub batch_type: Option<String>,

    /// Test mode: simulate every job instead of spawning it.
    #[arg(short = 'x')]
    pub test_mode: bool,

    /// Load and validate everything, print the plan, run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

/// Resolve parsed arguments into an engine [`BatchRequest`].
pub fn to_request(args: &CliArgs) -> Result<BatchRequest> {
    if let Some(number) = &args.batch_number {
        if number.len() != 14 || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(BatchError::Config(format!(
                "batch number must be 14 digits YYYYMMDDHH24MISS (got '{number}')"
            )));
        }
    }

    let batch_type = match &args.batch_type {
        Some(t) => {
            let parsed = BatchType::parse(t)?;
            if parsed == BatchType::Test {
                return Err(BatchError::Config(
                    "batch type TEST is set with -x, not -t".to_string(),
                ));
            }
            Some(parsed)
        }
        None => None,
    };

    if args.start_milestone.is_some() || args.end_milestone.is_some() {
        debug!(
            start = ?args.start_milestone,
            end = ?args.end_milestone,
            "milestone bounds accepted but not applied to launching"
        );
    }

    Ok(BatchRequest {
        alias: args.alias.clone(),
        batch_number: args.batch_number.clone(),
        process_date: args.process_date.clone(),
        batch_type,
        resurrect: args.resurrect,
        test_mode: args.test_mode,
    })
}
