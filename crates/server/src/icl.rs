// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Initial Connection Listener.
//!
//! One activity per configured transport mode. Owns a single listening
//! socket; accepts clients and hands each to a leased worker. A blocked
//! accept wakes on the slot's user event or on the wake interval, applies
//! any operator-posted values, and re-checks its shutdown word. Transport
//! failures enter a bounded reconnect loop with repeated-error log
//! suppression.

use crate::config::ListenHost;
use crate::messages::{localized, MsgId};
use crate::pool::ClientHandoff;
use crate::sgs::{PostedChange, ServerGlobalState};
use crate::transport::{self, StatusSuppressor};
use rdgate_core::ShutdownState;
use rdgate_wire::{ResponsePacket, TaskStatus};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Status recorded for bind/accept failures that carry no OS errno; the
/// transport-down status of the reconnect loop.
pub const STATUS_TRANSPORT_DOWN: i32 = 10001;

/// The listener activity for one ICL slot.
pub async fn run(sgs: Arc<ServerGlobalState>, icl_number: usize) {
    let mut suppressor = StatusSuppressor::new();
    let mut tries: u32 = 0;

    'reconnect: while sgs.icls[icl_number].shutdown_state() == ShutdownState::Active {
        let listener = match bind_listener(&sgs, icl_number).await {
            Ok(listener) => {
                tries = 0;
                listener
            }
            Err(status) => {
                let slot = &sgs.icls[icl_number];
                slot.last_status
                    .store(status, std::sync::atomic::Ordering::Release);
                if suppressor.should_log(status) {
                    sgs.log_message(&format!(
                        "ICL {icl_number}: listen socket unavailable, status {status}"
                    ));
                    warn!(icl = icl_number, status, "listen socket unavailable");
                }
                tries += 1;
                if tries >= sgs.config.reconnect_tries {
                    sgs.log_message(&format!(
                        "ICL {icl_number}: giving up after {tries} reconnect attempts"
                    ));
                    break 'reconnect;
                }
                backoff(&sgs, icl_number).await;
                continue 'reconnect;
            }
        };

        if let Ok(addr) = listener.local_addr() {
            *sgs.icls[icl_number].bound.lock() = Some(addr);
            sgs.log_message(&format!(
                "ICL {icl_number}: listening on {addr} (mode {})",
                sgs.icls[icl_number].endpoint.mode
            ));
            info!(icl = icl_number, %addr, "listening");
        }

        // Accept loop. Each wake-up, however caused, first applies any
        // posted values and re-checks the shutdown word.
        loop {
            apply_posted(&sgs, icl_number);
            if sgs.icls[icl_number].shutdown_state() != ShutdownState::Active {
                break 'reconnect;
            }

            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        suppressor = StatusSuppressor::new();
                        handle_accept(&sgs, icl_number, stream, peer);
                    }
                    Err(e) => {
                        let status = e.raw_os_error().unwrap_or(STATUS_TRANSPORT_DOWN);
                        let slot = &sgs.icls[icl_number];
                        slot.last_status.store(status, std::sync::atomic::Ordering::Release);
                        if suppressor.should_log(status) {
                            sgs.log_message(&format!(
                                "ICL {icl_number}: accept failed, status {status}; reconnecting"
                            ));
                            warn!(icl = icl_number, status, "accept failed; reconnecting");
                        }
                        // Rescind and close, then retry from startup.
                        drop(listener);
                        *sgs.icls[icl_number].bound.lock() = None;
                        backoff(&sgs, icl_number).await;
                        continue 'reconnect;
                    }
                },
                _ = sgs.icls[icl_number].notify.notified() => {
                    // User event: loop to apply posted values / shutdown.
                }
                _ = tokio::time::sleep(crate::env::accept_wake_interval()) => {}
            }
        }
    }

    // Shutdown: close the listen socket and zero it in SGS.
    *sgs.icls[icl_number].bound.lock() = None;
    sgs.icls[icl_number].set_shutdown(ShutdownState::Terminated);
    sgs.log_message(&format!("ICL {icl_number}: terminated"));

    // The coordinating listener forces still-graceful workers to
    // immediate once it can no longer hand them anything.
    let coordinator = sgs
        .coordinator_icl
        .load(std::sync::atomic::Ordering::Acquire);
    if coordinator == icl_number && sgs.server_shutdown() >= ShutdownState::Immediately {
        let upgraded = sgs.upgrade_graceful_workers();
        if upgraded > 0 {
            sgs.log_message(&format!(
                "ICL {icl_number}: forced {upgraded} workers to immediate shutdown"
            ));
        }
    }

    sgs.shutdown_notify.notify_waiters();
}

/// Apply operator-posted values for this listener and log what changed.
fn apply_posted(sgs: &Arc<ServerGlobalState>, icl_number: usize) {
    for change in sgs.take_posted(icl_number) {
        let text = match change {
            PostedChange::ReceiveTimeoutMs(ms) => {
                format!("ICL {icl_number}: server receive timeout now {ms} ms")
            }
            PostedChange::SendTimeoutMs(ms) => {
                format!("ICL {icl_number}: server send timeout now {ms} ms")
            }
            PostedChange::DebugLevel(level) => {
                format!("ICL {icl_number}: debug level now {level}")
            }
        };
        sgs.log_message(&text);
        debug!(icl = icl_number, ?change, "posted value applied");
    }
}

/// Lease a worker and bequeath the socket, or turn the client away.
fn handle_accept(
    sgs: &Arc<ServerGlobalState>,
    icl_number: usize,
    stream: TcpStream,
    peer: SocketAddr,
) {
    sgs.count_client();
    let _ = stream.set_nodelay(true);

    let socket_id = sgs.mint_socket_id();
    let mode = sgs.icls[icl_number].endpoint.mode;
    let Some(wde) = sgs.pool.lease(socket_id, peer, mode, sgs.now_ms()) else {
        sgs.log_message(&format!(
            "ICL {icl_number}: no worker available, closing client {peer}"
        ));
        warn!(icl = icl_number, %peer, "no free worker; client turned away");
        turn_away(sgs, stream);
        return;
    };

    sgs.log_message(&format!(
        "ICL {icl_number}: client connected from {peer} (socket {socket_id}, worker {})",
        wde.id
    ));
    if let Err(handoff) = wde.bequeath(ClientHandoff {
        stream,
        peer,
        socket_id,
        icl_number,
        transport_mode: mode,
    }) {
        // The worker activity is gone; undo the lease and drop the socket.
        warn!(worker = wde.id, "worker handoff failed; releasing lease");
        sgs.pool.release(wde.id);
        drop(handoff);
    }
}

/// One-shot server-busy reply: the client sees the defined status before
/// the socket closes, instead of a bare disconnect.
fn turn_away(sgs: &Arc<ServerGlobalState>, stream: TcpStream) {
    let response = ResponsePacket::error(
        0,
        TaskStatus::SERVER_BUSY,
        localized(&sgs.config.server_locale, MsgId::ServerBusy),
    );
    let Ok(payload) = response.encode() else {
        return;
    };
    let timeout = sgs.send_timeout();
    tokio::spawn(async move {
        let mut stream = stream;
        let _ = transport::send_frame(&mut stream, &payload, timeout).await;
    });
}

/// Bind the listen socket for this slot's endpoint.
///
/// Each transport mode after the first listens one port higher, so two
/// modes on one host do not collide. An ephemeral configured port (0)
/// stays ephemeral for every mode.
async fn bind_listener(
    sgs: &Arc<ServerGlobalState>,
    icl_number: usize,
) -> Result<TcpListener, i32> {
    let endpoint = &sgs.icls[icl_number].endpoint;
    let port = listen_port(sgs.config.host_port, endpoint.number, sgs.config.transport_modes.len());

    let ip: IpAddr = match &endpoint.host {
        ListenHost::Any => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        ListenHost::Addr(addr) => *addr,
        ListenHost::Name(name) => {
            let looked_up = tokio::net::lookup_host((name.as_str(), port))
                .await
                .map_err(|e| e.raw_os_error().unwrap_or(STATUS_TRANSPORT_DOWN))?
                .next()
                .ok_or(STATUS_TRANSPORT_DOWN)?;
            looked_up.ip()
        }
    };
    TcpListener::bind(SocketAddr::new(ip, port))
        .await
        .map_err(|e| e.raw_os_error().unwrap_or(STATUS_TRANSPORT_DOWN))
}

/// Port for a listener slot: mode index offsets the configured port.
fn listen_port(host_port: u16, endpoint_number: usize, n_modes: usize) -> u16 {
    if host_port == 0 {
        return 0;
    }
    let mode_index = if n_modes == 0 {
        0
    } else {
        endpoint_number % n_modes
    };
    host_port.saturating_add(mode_index as u16)
}

/// Wait out the reconnect back-off, waking early for user events.
async fn backoff(sgs: &Arc<ServerGlobalState>, icl_number: usize) {
    tokio::select! {
        _ = tokio::time::sleep(sgs.config.reconnect_retry_wait) => {}
        _ = sgs.icls[icl_number].notify.notified() => {}
    }
}

#[cfg(test)]
#[path = "icl_tests.rs"]
mod tests;
