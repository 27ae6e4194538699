// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server Worker activity.
//!
//! A worker is long-lived: it parks on its handoff channel between
//! clients, inherits one socket at a time, runs the request/response loop
//! for that connection, then returns to the free chain. Within a
//! connection, request/response pairs are strictly ordered: the next
//! receive does not begin until the previous response has been handed to
//! the transport.

use crate::dispatch::{self, SessionCtx};
use crate::messages::{localized, MsgId};
use crate::pool::{ClientHandoff, Wde};
use crate::sgs::ServerGlobalState;
use crate::transport::{self, RecvStatus, SendStatus};
use rdgate_core::ShutdownState;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// The worker activity: serve clients from the handoff channel until the
/// pool or a shutdown retires this slot.
pub async fn run(
    sgs: Arc<ServerGlobalState>,
    wde: Arc<Wde>,
    mut handoff_rx: mpsc::Receiver<ClientHandoff>,
) {
    while let Some(handoff) = handoff_rx.recv().await {
        serve_client(&sgs, &wde, handoff).await;

        let draining = wde.shutdown_state() != ShutdownState::Active
            || sgs.server_shutdown() != ShutdownState::Active;
        if draining {
            sgs.pool.retire(wde.id);
            debug!(worker = wde.id, "worker drained");
            break;
        }
        sgs.pool.release(wde.id);
    }
    sgs.shutdown_notify.notify_waiters();
}

/// Run one connection's request loop, then clean up.
async fn serve_client(sgs: &Arc<ServerGlobalState>, wde: &Arc<Wde>, handoff: ClientHandoff) {
    let ClientHandoff {
        stream,
        peer,
        socket_id,
        ..
    } = handoff;
    let (mut reader, mut writer) = stream.into_split();
    let mut session = SessionCtx::new(sgs);

    loop {
        wde.in_network_call.store(true, Ordering::Release);
        let received =
            transport::receive_frame(&mut reader, &wde.event, sgs.worker_receive_timeout()).await;
        wde.in_network_call.store(false, Ordering::Release);

        let bytes = match received {
            Ok(bytes) => bytes,
            Err(RecvStatus::TimedOut) => {
                // Idle client; the socket stays open. Poll shutdown state.
                if worker_state(sgs, wde) == ShutdownState::Active {
                    continue;
                }
                break;
            }
            Err(RecvStatus::UserEvent) => {
                // Shutdown wake-up (or a worker-targeted console command).
                if worker_state(sgs, wde) == ShutdownState::Active {
                    continue;
                }
                debug!(worker = wde.id, "user event during receive; exiting loop");
                break;
            }
            Err(RecvStatus::LostClient) => {
                debug!(worker = wde.id, %peer, "lost client");
                break;
            }
            Err(RecvStatus::Oversized(len)) => {
                sgs.log_message(&format!(
                    "worker {}: request frame of {len} bytes exceeds the limit; closing",
                    wde.id
                ));
                break;
            }
            Err(RecvStatus::Io(e)) => {
                sgs.log_message(&format!("worker {}: receive failed: {e}", wde.id));
                break;
            }
        };

        if bytes.is_empty() {
            // An empty frame carries nothing to dispatch.
            continue;
        }

        // Immediate shutdown abandons work that has not started.
        if worker_state(sgs, wde) == ShutdownState::Immediately {
            break;
        }

        let outcome = dispatch::process_task(sgs, wde, &mut session, &bytes).await;
        let payload = match outcome.response.encode() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(worker = wde.id, error = %e, "response encode failed");
                break;
            }
        };

        wde.in_network_call.store(true, Ordering::Release);
        let sent = transport::send_frame(&mut writer, &payload, sgs.send_timeout()).await;
        wde.in_network_call.store(false, Ordering::Release);
        match sent {
            Ok(()) => {}
            Err(SendStatus::LostClient) => {
                debug!(worker = wde.id, %peer, "client lost during send");
                break;
            }
            Err(SendStatus::Io(e)) => {
                sgs.log_message(&format!("worker {}: send failed: {e}", wde.id));
                break;
            }
        }

        if !outcome.keep_channel || !wde.working_on_client.load(Ordering::Acquire) {
            break;
        }
        // Graceful shutdown finishes this request/response pair and exits
        // on the next receive wake-up; immediate exits now.
        if worker_state(sgs, wde) == ShutdownState::Immediately {
            break;
        }
    }

    cleanup_connection(sgs, wde, &mut session, socket_id).await;
}

/// The state this worker acts on: its own word, or the server-wide word
/// when that is further along.
fn worker_state(sgs: &Arc<ServerGlobalState>, wde: &Arc<Wde>) -> ShutdownState {
    wde.shutdown_state().advanced_to(sgs.server_shutdown())
}

/// Close the database thread, the client trace file and the socket.
async fn cleanup_connection(
    sgs: &Arc<ServerGlobalState>,
    wde: &Arc<Wde>,
    session: &mut SessionCtx,
    socket_id: u64,
) {
    if let Some(thread) = session.thread.take() {
        // Abandoned mid-transaction work is rolled back before the thread
        // closes.
        if let Err(e) = sgs.engine.rollback(thread).await {
            debug!(worker = wde.id, error = %e, "rollback at cleanup failed");
        }
        if let Err(e) = sgs.engine.end_thread(thread).await {
            debug!(worker = wde.id, error = %e, "end-thread at cleanup failed");
        }
        wde.open_db_thread.store(false, Ordering::Release);
    }

    let trace_file = wde.trace_file.lock().take();
    if let Some(file) = trace_file {
        if let Err(e) = sgs.client_traces.lock().close(file.name()) {
            sgs.log_message(&format!(
                "{}: {}: {e}",
                localized(&sgs.config.server_locale, MsgId::TraceFileCloseFailed),
                file.name()
            ));
        }
    }

    transport::close_socket(socket_id as i64, None);
    sgs.log_message(&format!(
        "worker {}: client disconnected (socket {socket_id})",
        wde.id
    ));
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
