// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Localized operator- and client-facing message texts.
//!
//! Only the `en` table is built in; unknown locales fall back to it. The
//! per-worker locale is copied from SGS at connection start and may be
//! replaced by the client at begin-thread.

/// Message identities, in the order of the gateway status block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgId {
    InvalidRequestId,
    UnknownTaskCode,
    InternalError,
    ServerBusy,
    TraceFileOpenFailed,
    TraceFileCloseFailed,
    XaTokenMismatch,
    AccessDenied,
    ShutdownInProgress,
    BadRequestBody,
    InvalidCommand,
    WorkerNotFound,
    ShutdownAcknowledged,
}

/// Look up a message in the given locale.
pub fn localized(locale: &str, id: MsgId) -> &'static str {
    // The message tables are external collaborators; `en` ships built in
    // and every other locale falls back to it.
    let _ = locale;
    english(id)
}

fn english(id: MsgId) -> &'static str {
    match id {
        MsgId::InvalidRequestId => "invalid id in request packet",
        MsgId::UnknownTaskCode => "request packet task code is not recognised",
        MsgId::InternalError => "internal error processing task",
        MsgId::ServerBusy => "no server worker is available",
        MsgId::TraceFileOpenFailed => "unable to open client's server-side trace file",
        MsgId::TraceFileCloseFailed => "unable to close client's server-side trace file",
        MsgId::XaTokenMismatch => "non-transactional client accessing transactional server",
        MsgId::AccessDenied => "user is not authorized to access this server",
        MsgId::ShutdownInProgress => "server shutdown is in progress",
        MsgId::BadRequestBody => "request packet body could not be decoded",
        MsgId::InvalidCommand => "invalid command",
        MsgId::WorkerNotFound => "no assigned worker matches that id",
        MsgId::ShutdownAcknowledged => "shutdown initiated",
    }
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
