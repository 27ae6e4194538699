// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rdgate-core: shared vocabulary for the rdgate gateway server.
//!
//! Task codes, debug flag words, shutdown states, keep-alive policy and
//! run-id generation. Everything here is either carried inside wire packets
//! or read concurrently by more than one server activity, so the types are
//! small, `Copy` where possible, and free of I/O.

pub mod clock;
pub mod debug;
pub mod keepalive;
pub mod runid;
pub mod sql;
pub mod state;
pub mod task;

pub use clock::{Clock, FakeClock, SystemClock};
pub use debug::DebugFlags;
pub use keepalive::KeepAlivePolicy;
pub use runid::RunId;
pub use sql::{ColumnDesc, CursorId, Row, RowBlock, SqlSection, SqlValue};
pub use state::ShutdownState;
pub use task::{TaskClass, TaskCode};
