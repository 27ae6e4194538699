// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rdgate-server: the gateway server proper.
//!
//! Five long-lived activities cooperate around one shared
//! [`sgs::ServerGlobalState`]: the connection listeners ([`icl`]), the
//! worker pool ([`pool`], [`worker`]), the console handler ([`console`]),
//! the user-access security monitor ([`uasm`]) and the bootstrap in
//! [`lifecycle`]. Each worker runs the task dispatcher ([`dispatch`]) over
//! packets framed by `rdgate-wire`.

pub mod config;
pub mod console;
pub mod dispatch;
pub mod env;
pub mod icl;
pub mod lifecycle;
pub mod logging;
pub mod messages;
pub mod pool;
pub mod sgs;
pub mod transport;
pub mod uasm;
pub mod worker;

#[cfg(test)]
pub mod test_support;
