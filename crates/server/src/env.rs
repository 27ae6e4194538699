// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the server crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Server level string reported in begin-thread replies and on the console.
pub const SERVER_LEVEL: &str = concat!("RDGATE ", env!("CARGO_PKG_VERSION"));

/// Resolve state directory: RDGATE_STATE_DIR > XDG state dir > ~/.local/state/rdgate
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("RDGATE_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(state) = dirs::state_dir() {
        return Ok(state.join("rdgate"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/rdgate"))
}

/// Default configuration file path when none is given on the command line.
pub fn config_path() -> PathBuf {
    std::env::var("RDGATE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("rdgate.conf"))
}

/// How often a blocked accept wakes to re-check posted values and shutdown
/// state when no user event arrives.
pub fn accept_wake_interval() -> Duration {
    std::env::var("RDGATE_ACCEPT_WAKE_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(500))
}

/// Interval between user-access file re-reads.
pub fn uasm_interval() -> Duration {
    std::env::var("RDGATE_UASM_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// The original run id this server was launched under. Falls back to the
/// process id when the launcher did not provide one.
pub fn original_run_id() -> String {
    std::env::var("RDGATE_RUN_ID").unwrap_or_else(|_| format!("P{}", std::process::id() % 100_000))
}
