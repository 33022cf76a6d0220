// src/config/validate.rs

use crate::config::model::BatchConfig;
use crate::errors::{BatchError, Result};

/// Semantic validation of a loaded [`BatchConfig`].
///
/// Anything caught here is a pre-loop initialization error.
pub fn validate_config(cfg: &BatchConfig) -> Result<()> {
    if cfg.job_poll_interval == 0 {
        return Err(BatchError::Config(
            "JobPollInterval must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.perform_audit_table_updates {
        if cfg.audit_table_update_interval < cfg.job_poll_interval {
            return Err(BatchError::Config(format!(
                "AuditTableUpdateInterval ({}) must be >= JobPollInterval ({})",
                cfg.audit_table_update_interval, cfg.job_poll_interval
            )));
        }
        if cfg.bf_connect_string.trim().is_empty() {
            return Err(BatchError::Config(
                "BfConnectString is required when PerformAuditTableUpdates=Y".to_string(),
            ));
        }
    }

    Ok(())
}
