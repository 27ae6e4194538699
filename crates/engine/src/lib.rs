// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rdgate-engine: the seam between the gateway and the database engine.
//!
//! The gateway core never speaks SQL itself; it drives whatever implements
//! [`RelationalEngine`] through a narrow command/cursor interface. The crate
//! also ships [`MemoryEngine`], an in-memory implementation the test suites
//! run against.

pub mod error;
pub mod memory;
pub mod seam;

pub use error::EngineError;
pub use memory::MemoryEngine;
pub use seam::{
    DictionaryArgs, DictionaryQuery, ExecuteOutcome, NextResult, RelationalEngine,
    StatementOptions, ThreadId, ThreadOptions,
};
