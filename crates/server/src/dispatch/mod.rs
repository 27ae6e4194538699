// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task dispatcher.
//!
//! Single-threaded within a worker: decode the request packet, account
//! for it, settle the debug configuration (opening a client trace file
//! when demanded), invoke the task handler, finalize the response. The
//! channel survives every failure except a failed connection-lifecycle
//! task (begin-thread, end-thread, credentials-check).

mod handlers;
mod trace_file;

pub use trace_file::resolve_trace_name;

use crate::messages::{localized, MsgId};
use crate::pool::Wde;
use crate::sgs::ServerGlobalState;
use rdgate_core::{DebugFlags, ShutdownState, TaskCode};
use rdgate_engine::ThreadId;
use rdgate_wire::{
    DebugInfoTrailer, ProtocolError, RequestPacket, ResponsePacket, TaskStatus,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Connection-scoped dispatcher state, owned by the worker's task frame.
pub struct SessionCtx {
    pub thread: Option<ThreadId>,
    pub autocommit: bool,
    pub locale: String,
    pub fetch_block_rows: u32,
    /// Set once the connection begins a thread through the XA task.
    pub xa_mode: bool,
}

/// Default rows per fetch block when the client does not bound it.
pub const DEFAULT_FETCH_BLOCK_ROWS: u32 = 256;

impl SessionCtx {
    pub fn new(sgs: &Arc<ServerGlobalState>) -> Self {
        Self {
            thread: None,
            autocommit: false,
            locale: sgs.config.server_locale.clone(),
            fetch_block_rows: DEFAULT_FETCH_BLOCK_ROWS,
            xa_mode: false,
        }
    }
}

/// What the worker does with the channel after sending the response.
pub struct TaskOutcome {
    pub response: ResponsePacket,
    pub keep_channel: bool,
}

impl TaskOutcome {
    fn keep(response: ResponsePacket) -> Self {
        Self {
            response,
            keep_channel: true,
        }
    }
}

/// Process one request packet into one response packet.
pub async fn process_task(
    sgs: &Arc<ServerGlobalState>,
    wde: &Arc<Wde>,
    session: &mut SessionCtx,
    bytes: &[u8],
) -> TaskOutcome {
    // Step 1: header validation.
    let packet = match RequestPacket::decode(bytes) {
        Ok(packet) => packet,
        Err(ProtocolError::BadMagic { .. }) => {
            return TaskOutcome::keep(ResponsePacket::error(
                0,
                TaskStatus::INVALID_REQUEST_ID,
                localized(&session.locale, MsgId::InvalidRequestId),
            ));
        }
        Err(ProtocolError::UnknownTaskCode(code)) => {
            return TaskOutcome::keep(ResponsePacket::error(
                code,
                TaskStatus::UNKNOWN_TASK_CODE,
                format!(
                    "{} ({code})",
                    localized(&session.locale, MsgId::UnknownTaskCode)
                ),
            ));
        }
        Err(_) => {
            return TaskOutcome::keep(ResponsePacket::error(
                0,
                TaskStatus::BAD_REQUEST_BODY,
                localized(&session.locale, MsgId::BadRequestBody),
            ));
        }
    };
    let task = packet.header.task_code;

    // Step 2: accounting.
    let now_ms = sgs.now_ms();
    wde.task_code.store(task.as_u16() as u32, Ordering::Relaxed);
    wde.last_request_ms.store(now_ms, Ordering::Relaxed);
    let _ = wde
        .first_request_ms
        .compare_exchange(0, now_ms, Ordering::Relaxed, Ordering::Relaxed);
    sgs.account_request(task.as_u16());

    // A shutdown observed here still answers the request; the worker exits
    // right after the response for the immediate case.
    if sgs.server_shutdown() == ShutdownState::Terminated {
        return TaskOutcome {
            response: ResponsePacket::error(
                task.as_u16(),
                TaskStatus::SHUTDOWN_IN_PROGRESS,
                localized(&session.locale, MsgId::ShutdownInProgress),
            ),
            keep_channel: false,
        };
    }

    // Step 3: debug configuration.
    let mut flags = packet.header.debug_flags;
    let operator_level = sgs.effective_debug_level.load(Ordering::Acquire);
    if operator_level >= 1 {
        flags = flags.with(DebugFlags::DETAIL);
    }
    if operator_level >= 2 {
        flags = flags.with(DebugFlags::INTERNAL);
    }
    flags = (flags | sgs.forced_debug_flags() | wde.debug_override_flags()).effective();

    let mut opened_trace: Option<String> = None;
    if flags.wants_trace() && wde.trace_file.lock().is_none() {
        let requested = packet
            .debug_info
            .as_ref()
            .and_then(|area| area.trace_file_name.as_deref());
        let erase = packet
            .debug_info
            .as_ref()
            .map(|area| area.erase_trace_file)
            .unwrap_or(false);
        let resolved = resolve_trace_name(
            requested,
            &sgs.config.trace_qualifier,
            sgs.generated_run_id.as_str(),
            session.xa_mode,
            wde.socket_id.load(Ordering::Acquire),
        );
        let opened = {
            let mut traces = sgs.client_traces.lock();
            traces.open(&resolved, erase)
        };
        match opened {
            Ok(file) => {
                *wde.trace_file.lock() = Some(file);
                opened_trace = Some(resolved);
            }
            Err(e) => {
                let text = format!(
                    "{}: {resolved}: {e}",
                    localized(&session.locale, MsgId::TraceFileOpenFailed)
                );
                sgs.log_message(&text);
                return TaskOutcome::keep(ResponsePacket::error(
                    task.as_u16(),
                    TaskStatus::TRACE_FILE_OPEN_FAILED,
                    text,
                ));
            }
        }
    }
    if flags.detail() {
        if let Some(file) = wde.trace_file.lock().as_ref() {
            let prefix = &packet.header.debug_prefix;
            file.write_line(&format!("{prefix}task {task} received"));
        }
    }

    // XA discipline: a token change mid-connection narrows the legal
    // tasks to the connection-openers.
    let stored_token = wde.xa_token.load(Ordering::Acquire);
    if session.xa_mode
        && stored_token != 0
        && packet.header.xa_token != stored_token
        && !task.may_open_connection()
    {
        return TaskOutcome::keep(ResponsePacket::error(
            task.as_u16(),
            TaskStatus::XA_TOKEN_MISMATCH,
            localized(&session.locale, MsgId::XaTokenMismatch),
        ));
    }

    // Step 4: dispatch.
    let response = match handlers::dispatch(sgs, wde, session, &packet, flags).await {
        Ok(response) => response,
        Err(engine_error) => ResponsePacket::error(
            task.as_u16(),
            TaskStatus::engine(engine_error.code),
            engine_error.message,
        ),
    };

    // Step 5: finalization.
    let status = response.status;
    let mut response = response;
    if let Some(trace_file_name) = opened_trace {
        response = response.with_trailer(DebugInfoTrailer {
            trace_file_name,
            generated_run_id: sgs.generated_run_id.as_str().to_string(),
        });
    }

    // Failure classification: a failed connection-lifecycle task ends the
    // conversation; every other failure is carried in the response only.
    let keep_channel = if status.is_ok() {
        true
    } else {
        let closes = matches!(
            task,
            TaskCode::BeginThread | TaskCode::XaBeginThread | TaskCode::EndThread | TaskCode::UseridPassword
        );
        if closes {
            wde.working_on_client.store(false, Ordering::Release);
        }
        !closes
    };

    TaskOutcome {
        response,
        keep_channel,
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
