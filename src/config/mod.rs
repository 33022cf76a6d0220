// src/config/mod.rs

//! Batch configuration: flat `KEY=value` file parsing, the typed
//! [`BatchConfig`] model, and semantic validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::load_from_path;
pub use model::{BatchConfig, Criticality};
pub use validate::validate_config;

use std::path::Path;

use crate::errors::Result;

/// Load a configuration file and run semantic validation.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<BatchConfig> {
    let cfg = load_from_path(path)?;
    validate_config(&cfg)?;
    Ok(cfg)
}
