// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server Global State (SGS).
//!
//! One value, built by bootstrap, shared by every activity. Chains, files
//! and tables sit behind their own lock cells; word-sized scalars are
//! atomics read and written without locks. The console handler is the only
//! writer of shutdown words; listeners and workers poll them between
//! suspension points.

use parking_lot::Mutex;
use rdgate_core::{Clock, RunId, ShutdownState, SystemClock};
use rdgate_engine::RelationalEngine;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI32, AtomicU32, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::warn;

use crate::config::{IclEndpoint, ServerConfig};
use crate::logging::{ClientTraceTable, LogFile};
use crate::pool::{ClientHandoff, WdePool};
use crate::uasm::AccessTable;

/// Feature flag bit: the engine supports compiled SQL sections.
pub const FF_SUPPORTS_SQL_SECTION: u32 = 1 << 3;
/// Feature flag bit: fetch blocks are supported.
pub const FF_SUPPORTS_FETCH_BLOCK: u32 = 1 << 2;

/// Per-listener slot in SGS.
pub struct IclSlot {
    pub endpoint: IclEndpoint,
    /// Out-of-band wake-up for a blocked accept.
    pub notify: Notify,
    shutdown: AtomicU8,
    /// Bound listen address, zeroed when the listen socket is closed.
    pub bound: Mutex<Option<SocketAddr>>,
    /// Last transport status this listener saw, for diagnostics.
    pub last_status: AtomicI32,
}

impl IclSlot {
    fn new(endpoint: IclEndpoint) -> Self {
        Self {
            endpoint,
            notify: Notify::new(),
            shutdown: AtomicU8::new(ShutdownState::Active.as_u8()),
            bound: Mutex::new(None),
            last_status: AtomicI32::new(0),
        }
    }

    pub fn shutdown_state(&self) -> ShutdownState {
        ShutdownState::from_u8(self.shutdown.load(Ordering::Acquire))
    }

    pub fn set_shutdown(&self, state: ShutdownState) {
        let current = self.shutdown_state();
        self.shutdown
            .store(current.advanced_to(state).as_u8(), Ordering::Release);
    }
}

/// One operator-posted value cell.
///
/// The console handler stores; each listener applies the value on its next
/// wake and marks its bit. The cell zeroes once every listener has
/// converged, which is what makes posted-value convergence observable.
struct PostedCell {
    /// Zero means nothing posted. Debug level is stored as level + 1.
    value: AtomicU32,
    applied: AtomicU32,
}

impl PostedCell {
    fn new() -> Self {
        Self {
            value: AtomicU32::new(0),
            applied: AtomicU32::new(0),
        }
    }

    fn post(&self, value: u32) {
        self.applied.store(0, Ordering::Release);
        self.value.store(value, Ordering::Release);
    }

    fn peek(&self) -> u32 {
        self.value.load(Ordering::Acquire)
    }

    /// Apply for one listener; returns the value when it was non-zero.
    fn apply(&self, icl_number: usize, all_mask: u32) -> Option<u32> {
        let value = self.value.load(Ordering::Acquire);
        if value == 0 {
            return None;
        }
        let mask = self.applied.fetch_or(1 << icl_number, Ordering::AcqRel) | (1 << icl_number);
        if mask & all_mask == all_mask {
            self.value.store(0, Ordering::Release);
            self.applied.store(0, Ordering::Release);
        }
        Some(value)
    }
}

/// A change a listener just applied from the posted cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostedChange {
    ReceiveTimeoutMs(u32),
    SendTimeoutMs(u32),
    DebugLevel(u32),
}

/// Request/client counters.
#[derive(Debug, Default)]
pub struct Counters {
    pub clients: AtomicU64,
    pub requests: AtomicU64,
    pub last_task_code: AtomicU32,
    pub last_request_ms: AtomicU64,
}

/// The process-wide server state.
pub struct ServerGlobalState {
    pub config: ServerConfig,

    // Identity & versioning
    pub generated_run_id: RunId,
    pub original_run_id: String,
    pub server_level: String,
    pub engine_level: String,
    pub keyin_name: String,
    pub feature_flags: u32,

    // Worker pool
    pub pool: WdePool,

    // Listener slots
    pub icls: Vec<IclSlot>,
    /// Which listener owns shutdown coordination for workers.
    pub coordinator_icl: AtomicUsize,

    // Shutdown words
    server_shutdown: AtomicU8,
    console_shutdown: AtomicU8,
    uasm_shutdown: AtomicU8,
    /// Wakes the console handler's accept loop.
    pub console_notify: Notify,
    /// Wakes the bootstrap's shutdown wait.
    pub shutdown_notify: Notify,

    // Operator-posted values and their effective counterparts
    posted_receive_timeout: PostedCell,
    posted_send_timeout: PostedCell,
    posted_debug_level: PostedCell,
    pub effective_receive_timeout_ms: AtomicU32,
    pub effective_send_timeout_ms: AtomicU32,
    pub effective_debug_level: AtomicU32,
    /// Trace flags forced on server-wide by the console TURN command.
    forced_debug_flags: AtomicU32,

    // Counters & timestamps
    pub counters: Counters,
    start_ms: u64,
    next_socket_id: AtomicU64,

    // Logging
    pub log: Mutex<LogFile>,
    pub trace: Mutex<LogFile>,
    pub client_traces: Mutex<ClientTraceTable>,

    // User-access table maintained by the UASM
    pub access: Mutex<AccessTable>,

    // The engine seam
    pub engine: Arc<dyn RelationalEngine>,

    pub state_dir: PathBuf,
    pub keyin_socket_path: PathBuf,

    clock: Arc<dyn Clock>,
}

impl ServerGlobalState {
    /// Build SGS and the worker handoff receivers the lifecycle will
    /// spawn workers around.
    pub fn new(
        config: ServerConfig,
        engine: Arc<dyn RelationalEngine>,
        state_dir: PathBuf,
        log: LogFile,
        trace: LogFile,
    ) -> (Arc<Self>, Vec<(u32, mpsc::Receiver<ClientHandoff>)>) {
        Self::with_clock(config, engine, state_dir, log, trace, Arc::new(SystemClock))
    }

    /// Build SGS with an injected clock, so tests drive the stamped
    /// counters and uptime with a fake.
    pub fn with_clock(
        config: ServerConfig,
        engine: Arc<dyn RelationalEngine>,
        state_dir: PathBuf,
        log: LogFile,
        trace: LogFile,
        clock: Arc<dyn Clock>,
    ) -> (Arc<Self>, Vec<(u32, mpsc::Receiver<ClientHandoff>)>) {
        let generated_run_id = RunId::generate();
        let original_run_id = crate::env::original_run_id();
        let keyin_name = if config.keyin_id == "RUNID" {
            original_run_id.clone()
        } else {
            config.keyin_id.clone()
        };

        let mut feature_flags = FF_SUPPORTS_FETCH_BLOCK;
        if engine.supports_sql_sections() {
            feature_flags |= FF_SUPPORTS_SQL_SECTION;
        }
        // With access control enabled, deny until the monitor's first read.
        let user_access = config.user_access;

        let (pool, receivers) = WdePool::new(config.max_activities);
        let icls = config
            .icl_endpoints()
            .into_iter()
            .map(IclSlot::new)
            .collect();

        let client_traces = ClientTraceTable::new(
            state_dir.join("client-traces"),
            config.max_activities as usize,
        );
        let keyin_socket_path = state_dir.join(format!("{keyin_name}.keyin"));

        let sgs = Self {
            engine_level: engine.level(),
            server_level: crate::env::SERVER_LEVEL.to_string(),
            effective_receive_timeout_ms: AtomicU32::new(config.server_receive_timeout_ms),
            effective_send_timeout_ms: AtomicU32::new(config.server_send_timeout_ms),
            effective_debug_level: AtomicU32::new(0),
            start_ms: clock.epoch_millis(),
            config,
            generated_run_id,
            original_run_id,
            keyin_name,
            feature_flags,
            pool,
            icls,
            coordinator_icl: AtomicUsize::new(0),
            server_shutdown: AtomicU8::new(ShutdownState::Active.as_u8()),
            console_shutdown: AtomicU8::new(ShutdownState::Active.as_u8()),
            uasm_shutdown: AtomicU8::new(ShutdownState::Active.as_u8()),
            console_notify: Notify::new(),
            shutdown_notify: Notify::new(),
            forced_debug_flags: AtomicU32::new(0),
            posted_receive_timeout: PostedCell::new(),
            posted_send_timeout: PostedCell::new(),
            posted_debug_level: PostedCell::new(),
            counters: Counters::default(),
            next_socket_id: AtomicU64::new(1),
            log: Mutex::new(log),
            trace: Mutex::new(trace),
            client_traces: Mutex::new(client_traces),
            access: Mutex::new(AccessTable::empty(user_access)),
            engine,
            state_dir,
            keyin_socket_path,
            clock,
        };
        (Arc::new(sgs), receivers)
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.epoch_millis()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.now_ms().saturating_sub(self.start_ms) / 1000
    }

    pub fn mint_socket_id(&self) -> u64 {
        self.next_socket_id.fetch_add(1, Ordering::Relaxed)
    }

    // --- shutdown words ---

    pub fn server_shutdown(&self) -> ShutdownState {
        ShutdownState::from_u8(self.server_shutdown.load(Ordering::Acquire))
    }

    /// Monotonic advance of the server-wide state. Returns (before, after).
    pub fn advance_server_shutdown(
        &self,
        requested: ShutdownState,
    ) -> (ShutdownState, ShutdownState) {
        let mut current = self.server_shutdown();
        loop {
            let advanced = current.advanced_to(requested);
            if advanced == current {
                return (current, current);
            }
            match self.server_shutdown.compare_exchange(
                current.as_u8(),
                advanced.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return (current, advanced),
                Err(seen) => current = ShutdownState::from_u8(seen),
            }
        }
    }

    pub fn console_shutdown(&self) -> ShutdownState {
        ShutdownState::from_u8(self.console_shutdown.load(Ordering::Acquire))
    }

    pub fn set_console_shutdown(&self, state: ShutdownState) {
        self.console_shutdown.store(state.as_u8(), Ordering::Release);
        self.console_notify.notify_waiters();
    }

    pub fn uasm_shutdown(&self) -> ShutdownState {
        ShutdownState::from_u8(self.uasm_shutdown.load(Ordering::Acquire))
    }

    pub fn set_uasm_shutdown(&self, state: ShutdownState) {
        self.uasm_shutdown.store(state.as_u8(), Ordering::Release);
    }

    /// Deliver a user event to every listener's accept wait.
    pub fn notify_all_icls(&self) {
        for slot in &self.icls {
            slot.notify.notify_waiters();
            slot.notify.notify_one();
        }
    }

    /// Upgrade every assigned worker still in graceful shutdown to
    /// immediate, delivering a user event to each. Returns how many were
    /// upgraded. Used on the immediate transition, and again by the
    /// coordinating listener in case it outlived the console handler's
    /// sweep.
    pub fn upgrade_graceful_workers(&self) -> usize {
        let mut upgraded = 0;
        for id in self.pool.assigned_ids() {
            let Some(wde) = self.pool.wde(id) else {
                continue;
            };
            if wde.shutdown_state() == ShutdownState::Gracefully {
                wde.request_shutdown(ShutdownState::Immediately);
                wde.pass_event();
                upgraded += 1;
            }
        }
        upgraded
    }

    // --- counters ---

    pub fn count_client(&self) {
        self.counters.clients.fetch_add(1, Ordering::Relaxed);
    }

    pub fn account_request(&self, task_code: u16) {
        self.counters.requests.fetch_add(1, Ordering::Relaxed);
        self.counters
            .last_task_code
            .store(task_code as u32, Ordering::Relaxed);
        self.counters
            .last_request_ms
            .store(self.now_ms(), Ordering::Relaxed);
    }

    pub fn clear_client_counter(&self) {
        self.counters.clients.store(0, Ordering::Relaxed);
    }

    pub fn clear_request_counters(&self) {
        self.counters.requests.store(0, Ordering::Relaxed);
        self.counters.last_task_code.store(0, Ordering::Relaxed);
        self.counters.last_request_ms.store(0, Ordering::Relaxed);
    }

    // --- posted values ---

    pub fn post_receive_timeout_ms(&self, ms: u32) {
        self.posted_receive_timeout.post(ms);
    }

    pub fn post_send_timeout_ms(&self, ms: u32) {
        self.posted_send_timeout.post(ms);
    }

    /// Debug levels: 0 off, 1 force detail, 2 force internal.
    pub fn post_debug_level(&self, level: u32) {
        self.posted_debug_level.post(level + 1);
    }

    /// True when any posted cell still awaits application.
    pub fn has_pending_posted_values(&self) -> bool {
        self.posted_receive_timeout.peek() != 0
            || self.posted_send_timeout.peek() != 0
            || self.posted_debug_level.peek() != 0
    }

    /// Apply all posted cells for one listener; publishes each applied
    /// value into its effective field.
    pub fn take_posted(&self, icl_number: usize) -> Vec<PostedChange> {
        let all_mask = if self.icls.is_empty() {
            1
        } else {
            (1u32 << self.icls.len()) - 1
        };
        let mut changes = Vec::new();
        if let Some(ms) = self.posted_receive_timeout.apply(icl_number, all_mask) {
            self.effective_receive_timeout_ms.store(ms, Ordering::Release);
            changes.push(PostedChange::ReceiveTimeoutMs(ms));
        }
        if let Some(ms) = self.posted_send_timeout.apply(icl_number, all_mask) {
            self.effective_send_timeout_ms.store(ms, Ordering::Release);
            changes.push(PostedChange::SendTimeoutMs(ms));
        }
        if let Some(stored) = self.posted_debug_level.apply(icl_number, all_mask) {
            let level = stored - 1;
            self.effective_debug_level.store(level, Ordering::Release);
            changes.push(PostedChange::DebugLevel(level));
        }
        changes
    }

    /// Force a trace-flag bit on or off server-wide (console TURN).
    pub fn turn_debug_flag(&self, bit: u32, on: bool) {
        if on {
            self.forced_debug_flags.fetch_or(bit, Ordering::AcqRel);
        } else {
            self.forced_debug_flags.fetch_and(!bit, Ordering::AcqRel);
        }
    }

    pub fn forced_debug_flags(&self) -> rdgate_core::DebugFlags {
        rdgate_core::DebugFlags(self.forced_debug_flags.load(Ordering::Acquire))
    }

    pub fn receive_timeout(&self) -> Option<std::time::Duration> {
        ms_to_timeout(self.effective_receive_timeout_ms.load(Ordering::Acquire))
    }

    pub fn send_timeout(&self) -> Option<std::time::Duration> {
        ms_to_timeout(self.effective_send_timeout_ms.load(Ordering::Acquire))
    }

    pub fn worker_receive_timeout(&self) -> Option<std::time::Duration> {
        // The per-worker timeout keys off the activity setting, unless the
        // operator posted a server-wide receive timeout.
        let posted = self.effective_receive_timeout_ms.load(Ordering::Acquire);
        if posted != self.config.server_receive_timeout_ms {
            return ms_to_timeout(posted);
        }
        ms_to_timeout(self.config.worker_receive_timeout_ms)
    }

    // --- logging ---

    /// Append to the operator log under its lock cell.
    pub fn log_message(&self, message: &str) {
        if let Err(e) = self.log.lock().write_entry(message) {
            warn!(error = %e, "server log write failed");
        }
    }

    /// Append to the server trace file under its lock cell.
    pub fn trace_message(&self, message: &str) {
        if let Err(e) = self.trace.lock().write_entry(message) {
            warn!(error = %e, "server trace write failed");
        }
    }
}

fn ms_to_timeout(ms: u32) -> Option<std::time::Duration> {
    if ms == 0 {
        None
    } else {
        Some(std::time::Duration::from_millis(ms as u64))
    }
}

#[cfg(test)]
#[path = "sgs_tests.rs"]
mod tests;
