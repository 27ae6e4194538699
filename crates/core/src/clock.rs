// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so timestamp-dependent code is testable.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of wall-clock time, in epoch milliseconds.
///
/// The server stamps request/response activity with epoch milliseconds
/// (they surface in DISPLAY output, log lines and the uptime counter).
/// The global state holds the clock as a trait object so tests can drive
/// time with [`FakeClock`].
pub trait Clock: Send + Sync + 'static {
    fn epoch_millis(&self) -> u64;
}

/// The real system clock.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Controllable clock for tests. Clones share one time source.
#[derive(Clone)]
pub struct FakeClock {
    epoch_millis: Arc<Mutex<u64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            epoch_millis: Arc::new(Mutex::new(1_700_000_000_000)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.epoch_millis.lock() += by.as_millis() as u64;
    }

    pub fn set_epoch_millis(&self, ms: u64) {
        *self.epoch_millis.lock() = ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn epoch_millis(&self) -> u64 {
        *self.epoch_millis.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
