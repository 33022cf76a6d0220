// src/clock.rs

//! Wall-clock formatting and monotonic elapsed time.
//!
//! Two string formats are used everywhere in the audit contract:
//! - `YYYY-MM-DD HH:MM:SS` (default, human-readable)
//! - `YYYYMMDDHH24MISS` (compact, used for batch numbers)

use std::sync::OnceLock;
use std::time::Instant;

use chrono::Local;

pub const WALL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const COMPACT_FORMAT: &str = "%Y%m%d%H%M%S";

/// Current local time as `YYYY-MM-DD HH:MM:SS`.
pub fn now_wall() -> String {
    Local::now().format(WALL_FORMAT).to_string()
}

/// Current local time as a 14-digit `YYYYMMDDHH24MISS` string.
pub fn now_compact() -> String {
    Local::now().format(COMPACT_FORMAT).to_string()
}

/// Seconds elapsed since a fixed process-local epoch.
///
/// Only differences between two calls are ever observed, so the epoch itself
/// is immaterial; the monotonic clock makes the value immune to wall-clock
/// adjustments.
pub fn elapsed_seconds() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_secs()
}
