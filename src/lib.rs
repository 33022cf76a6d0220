// src/lib.rs

pub mod alert;
pub mod audit;
pub mod cli;
pub mod clock;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod locks;
pub mod logging;
pub mod msglog;
pub mod proclist;
pub mod recovery;
pub mod signals;
pub mod status;

use tracing::error;

use crate::cli::CliArgs;
use crate::config::BatchConfig;
use crate::engine::{BatchRequest, Engine, EngineOptions, ExitCode};
use crate::errors::Result;
use crate::proclist::{is_milestone, load_process_list, validate_process_list};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - the batch request resolved from the command line
/// - engine bootstrap (lock, process list, batch identity, audit plumbing)
/// - the scheduler loop
///
/// and maps every failure onto the documented exit codes.
pub async fn run(args: CliArgs) -> ExitCode {
    let cfg = match config::load_and_validate(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "configuration error");
            return ExitCode::InitError;
        }
    };

    if args.dry_run {
        return match print_dry_run(&cfg) {
            Ok(()) => ExitCode::Success,
            Err(e) => {
                error!(error = %e, "dry-run validation failed");
                ExitCode::InitError
            }
        };
    }

    let request: BatchRequest = match cli::to_request(&args) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "invalid command line");
            return ExitCode::InitError;
        }
    };

    let engine = match Engine::bootstrap(cfg, request, EngineOptions::default()).await {
        Ok(engine) => engine,
        Err(e) => {
            error!(error = %e, "batch initialization failed");
            return ExitCode::InitError;
        }
    };

    match engine.run().await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "critical engine error");
            ExitCode::EngineError
        }
    }
}

/// Dry-run output: validate everything, print the plan, execute nothing.
fn print_dry_run(cfg: &BatchConfig) -> Result<()> {
    let list = load_process_list(cfg.proc_file())?;
    validate_process_list(&list)?;

    println!("batchdag dry-run");
    println!("  application = {}", cfg.application_name);
    println!("  batch       = {}", cfg.batch_name);
    println!("  max_parallel_jobs = {}", cfg.max_parallel_jobs);
    println!("  job_poll_interval = {}s", cfg.job_poll_interval);
    println!();

    println!("processes ({}):", list.entries.len());
    for entry in &list.entries {
        if is_milestone(&entry.name) {
            println!("  - {} [milestone]", entry.name);
        } else {
            println!("  - {}", entry.name);
        }
        if !entry.predecessors.is_empty() {
            println!("      after: {:?}", entry.predecessors);
        }
    }

    if !list.commented_out.is_empty() {
        let mut names: Vec<&String> = list.commented_out.iter().collect();
        names.sort();
        println!();
        println!("commented out: {names:?}");
    }

    Ok(())
}
