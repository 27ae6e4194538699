// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run identifiers.
//!
//! A generated run id uniquely names one server execution instance and is
//! woven into log lines, trace file names and response debug trailers. The
//! original run id is the identity the server was launched under (process
//! environment), kept for console display.

use serde::{Deserialize, Serialize};
use std::fmt;

const RUN_ID_LEN: usize = 6;
const RUN_ID_ALPHABET: [char; 36] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// A six-character uppercase alphanumeric run identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Generate a fresh id for this server execution.
    pub fn generate() -> Self {
        Self(nanoid::nanoid!(RUN_ID_LEN, &RUN_ID_ALPHABET))
    }

    /// Wrap an identifier handed to us (the launch run id, or a test value).
    /// Uppercased; truncated to the wire width.
    pub fn from_string(id: impl AsRef<str>) -> Self {
        let mut id = id.as_ref().to_ascii_uppercase();
        id.truncate(RUN_ID_LEN);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "runid_tests.rs"]
mod tests;
