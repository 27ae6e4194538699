// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the server crate's test suites.

use crate::config::ServerConfig;
use crate::logging::LogFile;
use crate::pool::ClientHandoff;
use crate::sgs::ServerGlobalState;
use rdgate_core::{Clock, FakeClock, SystemClock};
use rdgate_engine::MemoryEngine;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A configuration suitable for in-process tests: tiny pool, fast
/// timeouts, loopback listener.
pub fn test_config_text(extra: &str) -> String {
    format!(
        "app_group_name = TESTGRP ;\n\
         server_name = TESTGATE ;\n\
         max_activities = 2 ;\n\
         max_queued_comapi = 2 ;\n\
         host_port = 0 ;\n\
         server_listens_on = 127.0.0.1 ;\n\
         server_receive_timeout = 2000 ;\n\
         server_send_timeout = 2000 ;\n\
         server_activity_receive_timeout = 2000 ;\n\
         {extra}"
    )
}

pub struct TestSgs {
    pub sgs: Arc<ServerGlobalState>,
    pub receivers: Vec<(u32, mpsc::Receiver<ClientHandoff>)>,
    pub engine: Arc<MemoryEngine>,
    // Held so the state directory outlives the SGS.
    pub dir: tempfile::TempDir,
}

/// Build an SGS over a MemoryEngine and a temp state directory.
pub fn sgs_with_config(extra: &str) -> TestSgs {
    sgs_with_engine(extra, Arc::new(MemoryEngine::new()))
}

pub fn sgs_with_engine(extra: &str, engine: Arc<MemoryEngine>) -> TestSgs {
    sgs_build(extra, engine, Arc::new(SystemClock))
}

/// Build an SGS whose time is driven by the given fake clock. Clones of
/// the clock share one time source, so the caller's handle keeps control.
pub fn sgs_with_clock(extra: &str, clock: Arc<FakeClock>) -> TestSgs {
    let clock_dyn: Arc<dyn Clock> = clock;
    sgs_build(extra, Arc::new(MemoryEngine::new()), clock_dyn)
}

fn sgs_build(extra: &str, engine: Arc<MemoryEngine>, clock: Arc<dyn Clock>) -> TestSgs {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let config = ServerConfig::from_text(&test_config_text(extra))
        .unwrap_or_else(|e| panic!("test config: {e}"));
    let log = LogFile::open(&dir.path().join("server.log"), 3)
        .unwrap_or_else(|e| panic!("log open: {e}"));
    let trace = LogFile::open(&dir.path().join("server.trc"), 3)
        .unwrap_or_else(|e| panic!("trace open: {e}"));
    let engine_dyn: Arc<dyn rdgate_engine::RelationalEngine> = engine.clone();
    let (sgs, receivers) = ServerGlobalState::with_clock(
        config,
        engine_dyn,
        dir.path().to_path_buf(),
        log,
        trace,
        clock,
    );
    TestSgs {
        sgs,
        receivers,
        engine,
        dir,
    }
}
