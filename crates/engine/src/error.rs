// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine status codes.
//!
//! Engines report failures as numeric statuses with a message; the gateway
//! forwards the status to the client unchanged. Two codes get special
//! dispatcher treatment (the compiled-section retry).

use thiserror::Error;

/// A failed engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("engine status {code}: {message}")]
pub struct EngineError {
    pub code: i32,
    pub message: String,
}

impl EngineError {
    /// The compiled section is no longer valid (schema changed under it).
    pub const SECTION_STALE: i32 = 6025;
    /// The section's verify id does not match the engine's current state.
    pub const SECTION_VERIFY_MISMATCH: i32 = 4025;
    /// The named thread is not open.
    pub const NO_SUCH_THREAD: i32 = 6001;
    /// The named cursor is not open.
    pub const NO_SUCH_CURSOR: i32 = 6002;
    /// The LOB handle is unknown or expired with its transaction.
    pub const NO_SUCH_LOB: i32 = 6003;
    /// Statement text the engine cannot run.
    pub const SYNTAX: i32 = 6010;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn no_such_thread() -> Self {
        Self::new(Self::NO_SUCH_THREAD, "database thread is not open")
    }

    pub fn no_such_cursor() -> Self {
        Self::new(Self::NO_SUCH_CURSOR, "cursor is not open")
    }

    pub fn no_such_lob() -> Self {
        Self::new(Self::NO_SUCH_LOB, "LOB handle is not valid")
    }

    /// True for the two statuses that trigger the dispatcher's
    /// re-execute-with-text-only retry.
    pub fn is_section_invalid(&self) -> bool {
        self.code == Self::SECTION_STALE || self.code == Self::SECTION_VERIFY_MISMATCH
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
