// src/errors.rs

//! Crate-wide error type and `Result` alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("process list error: {0}")]
    ProcessList(String),

    #[error("deadly embrace in predecessor graph: {0}")]
    Cycle(String),

    #[error("lock error: {0}")]
    Lock(String),

    #[error("audit error: {0}")]
    Audit(String),

    #[error("job control error: {0}")]
    JobControl(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BatchError>;
