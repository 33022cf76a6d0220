// src/audit/gate.rs

//! Criticality gate around the relational auditor.
//!
//! The engine talks to [`AuditGate`], never to [`TableAuditor`] directly.
//! The gate owns two policies the auditor itself must not know about:
//!
//! - the update-interval throttle (`AuditTableUpdateInterval`);
//! - the WARN/ERROR criticality latch: under WARN, a failed update disables
//!   further updates (with a single warning) until the operator drops
//!   `RETRY.flg`; under ERROR it is a fatal engine error.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::audit::table::TableAuditor;
use crate::config::Criticality;
use crate::errors::{BatchError, Result};
use crate::status::{BatchState, StatusStore};

pub struct AuditGate {
    auditor: TableAuditor,
    criticality: Criticality,
    interval: Duration,
    last_attempt: Option<Instant>,
    disabled: bool,
}

impl AuditGate {
    pub fn new(auditor: TableAuditor, criticality: Criticality, interval: Duration) -> Self {
        Self {
            auditor,
            criticality,
            interval,
            last_attempt: None,
            disabled: false,
        }
    }

    /// Whether updates are currently latched off (WARN policy after a
    /// failure).
    pub fn disabled(&self) -> bool {
        self.disabled
    }

    /// Trip the latch without an update attempt (used when the startup
    /// connectivity probe fails under WARN). The gate stays armed for
    /// `RETRY.flg`: the auditor's pool connects lazily, so updates resume
    /// once the database is reachable again.
    pub fn trip_latch(&mut self) {
        self.disabled = true;
    }

    /// Re-arm updates after `RETRY.flg`.
    pub fn clear_latch(&mut self) {
        if self.disabled {
            info!("audit table updates re-enabled by RETRY flag");
            self.disabled = false;
        }
    }

    /// Throttled per-tick update; a no-op while latched or inside the
    /// update interval.
    pub async fn tick_update(
        &mut self,
        batch: &BatchState,
        store: &StatusStore,
        heartbeat: &str,
    ) -> Result<()> {
        if self.disabled {
            return Ok(());
        }
        if let Some(last) = self.last_attempt {
            if last.elapsed() < self.interval {
                return Ok(());
            }
        }
        self.last_attempt = Some(Instant::now());
        self.update(batch, store, heartbeat).await
    }

    /// Unthrottled update used for the final write on engine exit.
    pub async fn final_update(
        &mut self,
        batch: &BatchState,
        store: &StatusStore,
        heartbeat: &str,
    ) -> Result<()> {
        if self.disabled {
            return Ok(());
        }
        self.last_attempt = Some(Instant::now());
        self.update(batch, store, heartbeat).await
    }

    async fn update(
        &mut self,
        batch: &BatchState,
        store: &StatusStore,
        heartbeat: &str,
    ) -> Result<()> {
        let result = async {
            self.auditor.upsert_batch(batch, heartbeat).await?;
            self.auditor.upsert_processes(batch, store).await
        }
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) => match self.criticality {
                Criticality::Error => Err(BatchError::Audit(format!(
                    "audit table update failed (criticality ERROR): {e}"
                ))),
                Criticality::Warn => {
                    warn!(
                        error = %e,
                        "audit table update failed; updates disabled until RETRY flag"
                    );
                    self.disabled = true;
                    Ok(())
                }
            },
        }
    }
}
