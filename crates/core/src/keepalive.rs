// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client keep-alive policy.
//!
//! The `always_*` forms pin the socket option server-side; the bare forms
//! set a default the client may override at begin-thread.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeepAlivePolicy {
    AlwaysOff,
    AlwaysOn,
    #[default]
    DefaultOff,
    DefaultOn,
}

impl KeepAlivePolicy {
    /// Socket option applied at accept time.
    pub fn initial(self) -> bool {
        matches!(self, Self::AlwaysOn | Self::DefaultOn)
    }

    pub fn client_may_override(self) -> bool {
        matches!(self, Self::DefaultOff | Self::DefaultOn)
    }

    /// Resolve a client's requested setting against the policy.
    pub fn approve(self, requested: bool) -> bool {
        if self.client_may_override() {
            requested
        } else {
            self.initial()
        }
    }
}

impl FromStr for KeepAlivePolicy {
    type Err = UnknownKeepAlive;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.to_ascii_lowercase().as_str() {
            "always_off" => Ok(Self::AlwaysOff),
            "always_on" => Ok(Self::AlwaysOn),
            "off" => Ok(Self::DefaultOff),
            "on" => Ok(Self::DefaultOn),
            _ => Err(UnknownKeepAlive(token.to_string())),
        }
    }
}

impl fmt::Display for KeepAlivePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::AlwaysOff => "always_off",
            Self::AlwaysOn => "always_on",
            Self::DefaultOff => "off",
            Self::DefaultOn => "on",
        };
        write!(f, "{token}")
    }
}

/// Unrecognised `client_keep_alive` configuration value.
#[derive(Debug, thiserror::Error)]
#[error("unknown keep-alive policy: {0:?}")]
pub struct UnknownKeepAlive(pub String);

#[cfg(test)]
#[path = "keepalive_tests.rs"]
mod tests;
