// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative shutdown states.
//!
//! One ordering is shared by the server, each listener, each worker, the
//! console handler and the security monitor: states only ever move toward
//! `Terminated`. Writers store the word; readers poll it between suspension
//! points.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shutdown progression for an activity or for the server as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ShutdownState {
    Active = 0,
    Gracefully = 1,
    Immediately = 2,
    Terminated = 3,
}

impl ShutdownState {
    pub fn from_u8(word: u8) -> Self {
        match word {
            0 => Self::Active,
            1 => Self::Gracefully,
            2 => Self::Immediately,
            _ => Self::Terminated,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    /// Monotonic advance: a request never moves the state backwards.
    pub fn advanced_to(self, requested: Self) -> Self {
        self.max(requested)
    }
}

impl fmt::Display for ShutdownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Active => "active",
            Self::Gracefully => "shutting-down-gracefully",
            Self::Immediately => "shutting-down-immediately",
            Self::Terminated => "terminated",
        };
        write!(f, "{text}")
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
