// src/recovery/mod.rs

//! Recovery of state from previous runs: the resurrection planner and the
//! last-success resolver.

pub mod last_success;
pub mod resurrect;

pub use last_success::{resolve_last_success, LastSuccess};
pub use resurrect::{plan_resurrection, ResurrectionPlan, SeededProcess};
