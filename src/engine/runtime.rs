// src/engine/runtime.rs

//! The tick-driven scheduler loop.
//!
//! One control task drives everything: each gated tick applies operator
//! signal edges, launches eligible processes in list order under the
//! concurrency cap, polls running jobs, recomputes aggregates, persists the
//! audit state, and decides whether the batch is finished. Child jobs are
//! independent OS processes observed only through their exit status.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::alert::{AlertContext, AlertSender, NoAlerts, SystemMailer};
use crate::audit::files::read_process_audit;
use crate::audit::{AuditGate, FileAudit, TableAuditor};
use crate::clock;
use crate::config::{BatchConfig, Criticality};
use crate::engine::archive;
use crate::engine::{BatchRequest, EngineOptions, ExitCode};
use crate::errors::{BatchError, Result};
use crate::exec::{JobKind, JobLauncher, JobOutcome, JobPoll, JobSpec, ProcessLauncher};
use crate::locks::{allocate_batch_number, BatchLock};
use crate::msglog::MessageLog;
use crate::proclist::{
    is_milestone, load_process_list, validate_process_list, DepGraph, ProcessList,
};
use crate::recovery::{plan_resurrection, resolve_last_success, LastSuccess};
use crate::signals::{SignalEdges, SignalMonitor};
use crate::status::{
    BatchState, BatchStatus, BatchType, ProcessState, StatusStore,
};

/// The batch execution engine: all run-time state for one batch run.
pub struct Engine {
    cfg: BatchConfig,
    graph: DepGraph,
    store: StatusStore,
    batch: BatchState,
    signals: SignalMonitor,
    files: FileAudit,
    gate: Option<AuditGate>,
    launcher: Box<dyn JobLauncher>,
    alerter: Box<dyn AlertSender>,
    msglog: MessageLog,
    last_success: LastSuccess,
    options: EngineOptions,
    run_order_counter: u32,
    test_mode: bool,
    /// Loop metric: engine clock reading at bootstrap.
    started_at: u64,
    /// Held for the engine's lifetime; released on drop.
    _lock: BatchLock,
}

impl Engine {
    /// Build a ready-to-run engine: lock, process list, validation, batch
    /// identity (fresh or resurrected), audit plumbing, last-success lookup.
    ///
    /// Every failure here is a pre-loop initialization error (exit 1).
    pub async fn bootstrap(
        cfg: BatchConfig,
        request: BatchRequest,
        options: EngineOptions,
    ) -> Result<Engine> {
        let lock = BatchLock::acquire(cfg.batch_lock_file())?;
        let mut msglog = MessageLog::open(cfg.message_log())?;

        let list = load_process_list(cfg.proc_file())?;
        validate_process_list(&list)?;
        let graph = DepGraph::from_list(&list);
        msglog.log(&format!(
            "process list validated: {} active processes",
            list.entries.len()
        ));

        let signals = SignalMonitor::new(cfg.poll_file_directory.clone());
        let test_mode = request.test_mode || signals.test_flag_present();
        if test_mode {
            msglog.log("test mode: all processes will be simulated");
        }
        let resurrect = request.resurrect || signals.resurrect_flag_present();

        let mut store = StatusStore::from_list(&list);
        let mut run_order_counter = 0;

        let (batch_number, run_number) = if resurrect {
            match Self::seed_resurrection(&cfg, &list, &mut store, &mut msglog)? {
                Some(identity) => identity,
                None => Self::fresh_identity(&cfg, &request)?,
            }
        } else {
            Self::fresh_identity(&cfg, &request)?
        };
        run_order_counter = run_order_counter.max(store.max_run_order());

        // Processes not seeded from the audit file run under the batch's
        // run number.
        for record in store.iter_mut() {
            if record.state == ProcessState::Waiting {
                record.run_number = run_number;
            }
        }

        let batch_type = if test_mode {
            BatchType::Test
        } else if let Some(explicit) = request.batch_type {
            explicit
        } else if std::env::var("RUN_BY_CRON").map(|v| v == "TRUE").unwrap_or(false) {
            BatchType::Auto
        } else {
            BatchType::Manual
        };

        let batch = BatchState {
            application_name: cfg.application_name.clone(),
            batch_name: cfg.batch_name.clone(),
            batch_alias: request
                .alias
                .clone()
                .unwrap_or_else(|| cfg.batch_name.clone()),
            batch_number,
            run_number,
            process_date: request
                .process_date
                .clone()
                .unwrap_or_else(clock::now_wall),
            batch_type,
            status: BatchStatus::Waiting,
            start_time: clock::now_wall(),
            end_time: String::new(),
        };

        let files = FileAudit::new(
            cfg.batch_audit_file(),
            cfg.process_audit_file(),
            cfg.history_file(),
        );

        let (gate, table_ref) = if cfg.perform_audit_table_updates {
            let auditor = TableAuditor::connect(&cfg)?;
            let interval = options
                .audit
                .unwrap_or(Duration::from_secs(cfg.audit_table_update_interval));
            let mut gate = AuditGate::new(
                auditor.clone(),
                cfg.audit_table_criticality,
                interval,
            );

            // The pool is lazy; probe reachability once so the criticality
            // policy applies before anything launches.
            match auditor.ping().await {
                Ok(()) => (Some(gate), Some(auditor)),
                Err(e) => match cfg.audit_table_criticality {
                    Criticality::Error => {
                        return Err(BatchError::Audit(format!(
                            "cannot connect to audit tables (criticality ERROR): {e}"
                        )));
                    }
                    Criticality::Warn => {
                        warn!(
                            error = %e,
                            "cannot connect to audit tables; updates latched off until RETRY flag"
                        );
                        msglog.log(
                            "audit table connection failed; updates latched off until RETRY flag",
                        );
                        gate.trip_latch();
                        (Some(gate), None)
                    }
                },
            }
        } else {
            (None, None)
        };

        let last_success =
            resolve_last_success(table_ref.as_ref(), &cfg.batch_name, &cfg.history_file())
                .await?;

        let alerter: Box<dyn AlertSender> =
            if cfg.send_failure_message && !cfg.alert_email_list.trim().is_empty() {
                Box::new(SystemMailer)
            } else {
                Box::new(NoAlerts)
            };

        let launcher: Box<dyn JobLauncher> =
            Box::new(ProcessLauncher::new(cfg.exit_code_log_recovery));

        msglog.log(&format!(
            "batch {} run {} initialized (batch number {}, type {})",
            batch.batch_name, batch.run_number, batch.batch_number, batch.batch_type
        ));

        Ok(Engine {
            cfg,
            graph,
            store,
            batch,
            signals,
            files,
            gate,
            launcher,
            alerter,
            msglog,
            last_success,
            options,
            run_order_counter,
            test_mode,
            started_at: clock::elapsed_seconds(),
            _lock: lock,
        })
    }

    /// Substitute the job launcher (test seam).
    pub fn with_launcher(mut self, launcher: Box<dyn JobLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Substitute the alert sender (test seam).
    pub fn with_alerter(mut self, alerter: Box<dyn AlertSender>) -> Self {
        self.alerter = alerter;
        self
    }

    /// Current batch identity, for callers that report on the run.
    pub fn batch(&self) -> &BatchState {
        &self.batch
    }

    /// Fresh batch identity: explicit number or allocated, run number 1.
    fn fresh_identity(cfg: &BatchConfig, request: &BatchRequest) -> Result<(String, u32)> {
        let number = match &request.batch_number {
            Some(explicit) => explicit.clone(),
            None => allocate_batch_number(cfg.allocator_lock_file())?,
        };
        Ok((number, 1))
    }

    /// Seed the status store from the previous run's process audit file.
    ///
    /// Returns the resurrected `(batch_number, run_number)`, or `None` when
    /// the last run needs no resurrection.
    fn seed_resurrection(
        cfg: &BatchConfig,
        list: &ProcessList,
        store: &mut StatusStore,
        msglog: &mut MessageLog,
    ) -> Result<Option<(String, u32)>> {
        let rows = read_process_audit(cfg.process_audit_file())?;
        let Some(plan) = plan_resurrection(&rows) else {
            msglog.log("resurrection requested but last run succeeded; starting fresh batch");
            return Ok(None);
        };

        for seed in &plan.seeded {
            let Some(record) = store.get_mut(&seed.name) else {
                // Audited process no longer in the list; nothing to seed.
                debug!(process = %seed.name, "audited process absent from process list");
                continue;
            };
            record.run_number = seed.run_number;
            record.run_order = seed.run_order;
            record.state = seed.state;
            record.start_time = seed.start_time.clone();
            record.end_time = seed.end_time.clone();
        }

        let resumed = plan
            .seeded
            .iter()
            .filter(|s| s.state == ProcessState::Successful)
            .count();
        msglog.log(&format!(
            "resurrecting batch number {} as run {}: {} of {} processes already successful",
            plan.batch_number,
            plan.run_number,
            resumed,
            list.entries.len()
        ));

        Ok(Some((plan.batch_number, plan.run_number)))
    }

    /// Run the batch to completion and return the process exit code.
    pub async fn run(mut self) -> Result<ExitCode> {
        info!(
            batch = %self.batch.batch_name,
            batch_number = %self.batch.batch_number,
            run_number = self.batch.run_number,
            "scheduler loop starting"
        );

        let outcome = self.run_loop().await;

        let exit = match &outcome {
            Ok(code) => *code,
            Err(e) => {
                error!(error = %e, "fatal engine error");
                self.msglog.log(&format!("fatal engine error: {e}"));
                ExitCode::EngineError
            }
        };

        if let Err(e) = self.finalize(exit).await {
            error!(error = %e, "finalization failed");
            self.msglog.log(&format!("finalization failed: {e}"));
            if outcome.is_ok() {
                return Err(e);
            }
        }

        outcome
    }

    /// The tick loop. Every error returned here is a critical engine error.
    async fn run_loop(&mut self) -> Result<ExitCode> {
        let poll_interval = self
            .options
            .poll
            .unwrap_or(Duration::from_secs(self.cfg.job_poll_interval));
        let mut last_work: Option<Instant> = None;

        loop {
            tokio::time::sleep(self.options.tick).await;

            if let Some(t) = last_work {
                if t.elapsed() < poll_interval {
                    continue;
                }
            }
            last_work = Some(Instant::now());

            // One timestamp per tick: every status change and audit write
            // below agrees on it.
            let tick_time = clock::now_wall();

            let edges = self.signals.poll();
            self.log_signal_edges(&edges);
            if edges.retry {
                if let Some(gate) = self.gate.as_mut() {
                    gate.clear_latch();
                }
            }

            if !self.signals.paused && !self.signals.stopped {
                self.launch_eligible(&tick_time)?;
            }

            self.poll_running(&tick_time)?;

            let agg = self.store.aggregates();
            self.batch.status = if agg.running > 0 {
                BatchStatus::Running
            } else {
                BatchStatus::Waiting
            };

            self.files.write_batch(&self.batch)?;
            self.files.write_processes(&self.batch, &self.store)?;
            if let Some(gate) = self.gate.as_mut() {
                gate.tick_update(&self.batch, &self.store, &tick_time).await?;
            }

            if agg.failed == 0 && agg.running == 0 && agg.waiting == 0 {
                return Ok(ExitCode::Success);
            }
            if agg.failed == 0 && agg.running == 0 && agg.waiting > 0 && self.signals.stopped
            {
                self.msglog
                    .log("stopped by operator with processes still waiting");
                return Ok(ExitCode::Stopped);
            }
            if agg.failed > 0 && agg.running == 0 {
                return Ok(ExitCode::JobFailed);
            }
        }
    }

    fn log_signal_edges(&mut self, edges: &SignalEdges) {
        if edges.pause_entered {
            self.msglog.log("PAUSE flag detected; launches suspended");
        }
        if edges.pause_exited {
            self.msglog.log("PAUSE flag removed; launches resumed");
        }
        if edges.stop_entered {
            self.msglog
                .log("STOP flag detected; no further processes will be launched");
        }
        if edges.stop_exited {
            self.msglog.log("STOP flag removed");
        }
        if edges.retry {
            self.msglog.log("RETRY flag consumed");
        }
    }

    /// Launch phase: walk the list in natural order and start every WAITING
    /// process whose predecessors are all SUCCESSFUL, while no process has
    /// failed and the concurrency cap leaves room.
    fn launch_eligible(&mut self, tick_time: &str) -> Result<()> {
        // Fail-fast rule: any failure anywhere suppresses all launches,
        // including unrelated branches.
        if self.store.any_failed() {
            return Ok(());
        }

        let cap = self.cfg.max_parallel_jobs as usize;
        let mut running = self.store.aggregates().running;

        for name in self.store.names() {
            if self.store.state_of(&name) != Some(ProcessState::Waiting) {
                continue;
            }
            if cap > 0 && running >= cap {
                break;
            }

            let ready = self
                .graph
                .predecessors_of(&name)
                .iter()
                .all(|p| self.store.state_of(p) == Some(ProcessState::Successful));
            if !ready {
                continue;
            }

            self.launch_one(&name, tick_time)?;
            running += 1;
        }

        Ok(())
    }

    /// Start a single process and record the transition to RUNNING.
    fn launch_one(&mut self, name: &str, tick_time: &str) -> Result<()> {
        let kind = if self.test_mode || is_milestone(name) {
            JobKind::Synthetic
        } else {
            JobKind::Command
        };

        let spec = JobSpec {
            name: name.to_string(),
            kind,
            program: self.cfg.job_program(name),
            config_file: self.cfg.config_file.clone(),
            log_file: self.cfg.job_log(name),
            env: self.child_env(),
        };

        let handle = self.launcher.launch(&spec)?;

        self.run_order_counter += 1;
        let run_order = self.run_order_counter;
        let pid = handle.pid();

        let Some(record) = self.store.get_mut(name) else {
            warn!(process = %name, "launched process missing from status store");
            return Ok(());
        };
        record.handle = Some(handle);
        record.pid = pid;
        record.state = ProcessState::Running;
        record.start_time = tick_time.to_string();
        record.run_order = run_order;

        self.msglog.log(&format!(
            "process {name} started (run order {run_order}{})",
            pid.map(|p| format!(", pid {p}")).unwrap_or_default()
        ));

        Ok(())
    }

    /// Poll phase: check every RUNNING process and record completions, all
    /// stamped with the shared tick timestamp.
    fn poll_running(&mut self, tick_time: &str) -> Result<()> {
        let mut failed: Vec<String> = Vec::new();

        for name in self.store.names() {
            let Some(record) = self.store.get_mut(&name) else {
                continue;
            };
            if record.state != ProcessState::Running {
                continue;
            }
            let Some(handle) = record.handle.as_mut() else {
                warn!(process = %name, "RUNNING process has no handle; marking failed");
                record.state = ProcessState::Failed;
                record.end_time = tick_time.to_string();
                failed.push(name.clone());
                continue;
            };

            match self.launcher.poll(&name, handle)? {
                JobPoll::Running => {}
                JobPoll::Done(outcome) => {
                    record.handle = None;
                    record.end_time = tick_time.to_string();
                    match outcome {
                        JobOutcome::Success => {
                            record.state = ProcessState::Successful;
                            self.msglog.log(&format!("process {name} completed successfully"));
                        }
                        JobOutcome::Failed(code) => {
                            record.state = ProcessState::Failed;
                            self.msglog
                                .log(&format!("process {name} FAILED with exit code {code}"));
                            failed.push(name.clone());
                        }
                    }
                }
            }
        }

        for name in failed {
            self.send_failure_alert(&name);
        }

        Ok(())
    }

    fn send_failure_alert(&mut self, process_name: &str) {
        let ctx = AlertContext {
            process_name: process_name.to_string(),
            application_name: self.cfg.application_name.clone(),
            batch_name: self.cfg.batch_name.clone(),
            job_path: self.cfg.job_program(process_name),
            log_path: self.cfg.job_log(process_name),
            recipients: self.cfg.alert_email_list.clone(),
        };
        if let Err(e) = self.alerter.send_failure_alert(&ctx) {
            warn!(process = %process_name, error = %e, "failure alert could not be sent");
        }
    }

    /// Environment exported to every launched job.
    fn child_env(&self) -> Vec<(String, String)> {
        vec![
            ("BatchName".to_string(), self.batch.batch_name.clone()),
            ("BatchNumber".to_string(), self.batch.batch_number.clone()),
            ("RunNumber".to_string(), self.batch.run_number.to_string()),
            ("ProcessDate".to_string(), self.batch.process_date.clone()),
            (
                "LastSuccessfulBatchNumber".to_string(),
                self.last_success.batch_number.clone(),
            ),
            (
                "LastSuccessfulRunNumber".to_string(),
                self.last_success.run_number.to_string(),
            ),
            (
                "LastSuccessfulProcessDate".to_string(),
                self.last_success.process_date.clone(),
            ),
        ]
    }

    /// Final audit writes, history append, forced table update and log
    /// archiving.
    async fn finalize(&mut self, exit: ExitCode) -> Result<()> {
        let now = clock::now_wall();
        self.batch.status = if exit == ExitCode::Success {
            BatchStatus::Successful
        } else {
            BatchStatus::Failed
        };
        self.batch.end_time = now.clone();

        self.files.write_batch(&self.batch)?;
        self.files.write_processes(&self.batch, &self.store)?;
        self.files.append_history()?;
        if let Some(gate) = self.gate.as_mut() {
            gate.final_update(&self.batch, &self.store, &now).await?;
        }

        self.msglog.log(&format!(
            "batch {} run {} ended with status {} after {}s (exit code {})",
            self.batch.batch_name,
            self.batch.run_number,
            self.batch.status,
            clock::elapsed_seconds().saturating_sub(self.started_at),
            exit.code()
        ));

        archive::archive_logs(&self.cfg, &self.batch)?;
        Ok(())
    }
}
