// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The server-wide shutdown state machine and worker-targeted commands.
//!
//! The console handler is the only writer of shutdown words. Transitions
//! are monotonic: active, gracefully, immediately, terminated, never
//! backwards.

use crate::console::command::WorkerTarget;
use crate::messages::{localized, MsgId};
use crate::pool::Wde;
use crate::sgs::ServerGlobalState;
use rdgate_core::ShutdownState;
use std::sync::Arc;
use tracing::info;

/// Drive the server-wide machine to the requested state and fan the side
/// effects out. Returns the operator reply.
pub fn shutdown_server(sgs: &Arc<ServerGlobalState>, requested: ShutdownState) -> String {
    let (before, after) = sgs.advance_server_shutdown(requested);
    if before == after {
        return format!("server already {after}");
    }
    info!(%before, %after, "server shutdown state advanced");
    sgs.log_message(&format!("shutdown: {before} -> {after}"));

    // Every listener and the security monitor learn the new state; a user
    // event wakes each blocked accept.
    for slot in &sgs.icls {
        slot.set_shutdown(after);
    }
    sgs.set_uasm_shutdown(after);
    sgs.notify_all_icls();

    // Workers: on the graceful transition each assigned worker is asked to
    // finish its current request; on the immediate transition everyone
    // still assigned is forced, covering listeners that already exited.
    for id in sgs.pool.assigned_ids() {
        if let Some(wde) = sgs.pool.wde(id) {
            wde.request_shutdown(after);
            wde.pass_event();
        }
    }

    sgs.shutdown_notify.notify_waiters();
    format!(
        "{} ({after})",
        localized(&sgs.config.server_locale, MsgId::ShutdownAcknowledged)
    )
}

/// SHUTDOWN WORKER / ABORT WORKER: set one worker's shutdown word and
/// wake its blocked receive.
pub fn shutdown_worker(
    sgs: &Arc<ServerGlobalState>,
    target: &WorkerTarget,
    how: ShutdownState,
) -> String {
    let Some(wde) = find_worker(sgs, target) else {
        return localized(&sgs.config.server_locale, MsgId::WorkerNotFound).to_string();
    };
    wde.request_shutdown(how);
    wde.pass_event();
    sgs.log_message(&format!("worker {} shutdown requested ({how})", wde.id));
    format!("worker {} {how}", wde.id)
}

/// Locate an assigned worker by decimal socket id or thread name.
pub fn find_worker(sgs: &Arc<ServerGlobalState>, target: &WorkerTarget) -> Option<Arc<Wde>> {
    match target {
        WorkerTarget::SocketId(id) => sgs.pool.find_by_socket_id(*id),
        WorkerTarget::ThreadName(name) => sgs.pool.find_by_thread_name(name),
    }
}

/// ABORT: tear everything down and leave. Control does not return.
pub fn abort_server(sgs: &Arc<ServerGlobalState>) -> ! {
    prepare_abort(sgs);
    std::process::exit(0);
}

/// The abort side effects, separated so they are testable: force every
/// state word to terminated, wake everything, close the server files and
/// deregister the keyin socket.
pub fn prepare_abort(sgs: &Arc<ServerGlobalState>) {
    sgs.log_message("ABORT: abnormal server termination");
    sgs.advance_server_shutdown(ShutdownState::Terminated);
    for slot in &sgs.icls {
        slot.set_shutdown(ShutdownState::Terminated);
    }
    sgs.set_uasm_shutdown(ShutdownState::Terminated);
    for id in sgs.pool.assigned_ids() {
        if let Some(wde) = sgs.pool.wde(id) {
            wde.request_shutdown(ShutdownState::Immediately);
            wde.pass_event();
        }
    }
    sgs.notify_all_icls();
    sgs.set_console_shutdown(ShutdownState::Terminated);
    sgs.shutdown_notify.notify_waiters();

    let _ = std::fs::remove_file(&sgs.keyin_socket_path);
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
