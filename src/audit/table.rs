// src/audit/table.rs

//! Relational audit: upserts into `etl_batch_audit` and `etl_process_audit`.
//!
//! Rows are keyed by `(system_name, batch_number, run_number)` and
//! `(system_name, batch_number, process_name, run_number)` respectively. An
//! update first counts rows by key: 0 inserts, 1 updates, anything else is a
//! fatal data error. The batch row's `heartbeat` column is advanced on every
//! touch, signalling liveness to fleet monitoring.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::debug;

use crate::config::BatchConfig;
use crate::errors::{BatchError, Result};
use crate::status::{BatchState, StatusStore};

/// Connection to the audit schema, scoped to one application.
#[derive(Debug, Clone)]
pub struct TableAuditor {
    pool: PgPool,
    system_name: String,
}

impl TableAuditor {
    /// Build the auditor from the `Bf*` credentials in the batch
    /// configuration.
    ///
    /// `BfConnectString` is either a full URL or a bare `host[:port]/db`
    /// fragment combined with `BfUserId` / `BfUserPassword`. The pool is
    /// lazy: no connection is attempted until the first query, so an
    /// unreachable database surfaces through [`Self::ping`] or the first
    /// upsert, not here.
    pub fn connect(cfg: &BatchConfig) -> Result<Self> {
        let url = if cfg.bf_connect_string.contains("://") {
            cfg.bf_connect_string.clone()
        } else {
            format!(
                "postgres://{}:{}@{}",
                cfg.bf_user_id, cfg.bf_user_password, cfg.bf_connect_string
            )
        };

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(&url)?;

        Ok(Self {
            pool,
            system_name: cfg.application_name.clone(),
        })
    }

    /// Round-trip probe used at startup to decide the criticality path.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Insert or update the batch audit row, advancing the heartbeat.
    pub async fn upsert_batch(&self, batch: &BatchState, heartbeat: &str) -> Result<()> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM etl_batch_audit \
             WHERE system_name = $1 AND batch_number = $2 AND run_number = $3",
        )
        .bind(&self.system_name)
        .bind(&batch.batch_number)
        .bind(batch.run_number as i32)
        .fetch_one(&self.pool)
        .await?;

        let end_time = if batch.status.is_terminal() {
            batch.end_time.as_str()
        } else {
            ""
        };

        match count {
            0 => {
                sqlx::query(
                    "INSERT INTO etl_batch_audit \
                     (system_name, batch_number, run_number, batch_name, process_date, \
                      batch_status, batch_start_time, batch_end_time, batch_type, \
                      batch_alias, heartbeat) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
                )
                .bind(&self.system_name)
                .bind(&batch.batch_number)
                .bind(batch.run_number as i32)
                .bind(&batch.batch_name)
                .bind(&batch.process_date)
                .bind(batch.status.as_str())
                .bind(&batch.start_time)
                .bind(end_time)
                .bind(batch.batch_type.as_str())
                .bind(&batch.batch_alias)
                .bind(heartbeat)
                .execute(&self.pool)
                .await?;
                debug!(batch_number = %batch.batch_number, "batch audit row inserted");
            }
            1 => {
                sqlx::query(
                    "UPDATE etl_batch_audit \
                     SET batch_status = $4, batch_end_time = $5, heartbeat = $6 \
                     WHERE system_name = $1 AND batch_number = $2 AND run_number = $3",
                )
                .bind(&self.system_name)
                .bind(&batch.batch_number)
                .bind(batch.run_number as i32)
                .bind(batch.status.as_str())
                .bind(end_time)
                .bind(heartbeat)
                .execute(&self.pool)
                .await?;
            }
            n => {
                return Err(BatchError::Audit(format!(
                    "etl_batch_audit holds {n} rows for ({}, {}, {}); expected 0 or 1",
                    self.system_name, batch.batch_number, batch.run_number
                )));
            }
        }

        Ok(())
    }

    /// Insert or update one row per process.
    pub async fn upsert_processes(&self, batch: &BatchState, store: &StatusStore) -> Result<()> {
        for record in store.iter() {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM etl_process_audit \
                 WHERE system_name = $1 AND batch_number = $2 \
                   AND process_name = $3 AND run_number = $4",
            )
            .bind(&self.system_name)
            .bind(&batch.batch_number)
            .bind(&record.name)
            .bind(record.run_number as i32)
            .fetch_one(&self.pool)
            .await?;

            match count {
                0 => {
                    sqlx::query(
                        "INSERT INTO etl_process_audit \
                         (system_name, batch_number, process_name, run_number, batch_name, \
                          process_status, process_start_time, process_end_time) \
                         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                    )
                    .bind(&self.system_name)
                    .bind(&batch.batch_number)
                    .bind(&record.name)
                    .bind(record.run_number as i32)
                    .bind(&batch.batch_name)
                    .bind(record.state.as_str())
                    .bind(&record.start_time)
                    .bind(&record.end_time)
                    .execute(&self.pool)
                    .await?;
                }
                1 => {
                    sqlx::query(
                        "UPDATE etl_process_audit \
                         SET process_status = $5, process_start_time = $6, \
                             process_end_time = $7 \
                         WHERE system_name = $1 AND batch_number = $2 \
                           AND process_name = $3 AND run_number = $4",
                    )
                    .bind(&self.system_name)
                    .bind(&batch.batch_number)
                    .bind(&record.name)
                    .bind(record.run_number as i32)
                    .bind(record.state.as_str())
                    .bind(&record.start_time)
                    .bind(&record.end_time)
                    .execute(&self.pool)
                    .await?;
                }
                n => {
                    return Err(BatchError::Audit(format!(
                        "etl_process_audit holds {n} rows for ({}, {}, {}, {}); expected 0 or 1",
                        self.system_name, batch.batch_number, record.name, record.run_number
                    )));
                }
            }
        }

        Ok(())
    }

    /// Most recent SUCCESSFUL batch row for `(system_name, batch_name)`,
    /// as `(batch_number, run_number, process_date)`.
    pub async fn last_successful_batch(
        &self,
        batch_name: &str,
    ) -> Result<Option<(String, u32, String)>> {
        let row: Option<(String, i32, String)> = sqlx::query_as(
            "SELECT batch_number, run_number, process_date FROM etl_batch_audit \
             WHERE system_name = $1 AND batch_name = $2 AND batch_status = 'SUCCESSFUL' \
             ORDER BY batch_number DESC, run_number DESC \
             LIMIT 1",
        )
        .bind(&self.system_name)
        .bind(batch_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(number, run, date)| (number, run as u32, date)))
    }
}
