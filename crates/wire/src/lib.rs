// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client/server packet protocol.
//!
//! Wire format: 4-byte length prefix (big-endian) + packet bytes. A packet
//! is a fixed binary header followed by a JSON task body and an optional
//! JSON debug-info area. Integers in the header are big-endian.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod body;
mod frame;
mod request;
mod response;

pub use body::{
    AccessKind, AutocommitBody, BeginThreadBody, BeginThreadReplyBody, BlobDataBody,
    BlobDataReplyBody, BlobTruncateBody, BlobWriteBody, ErrorBody, ExecuteBody, ExecuteReplyBody,
    FetchBody, LobHandleBody, LobHandleReplyBody, MetadataArgs, NextResultReplyBody, RowsBody,
    UseridPasswordBody,
};
pub use frame::{read_frame, write_frame, MAX_FRAME_BYTES};
pub use request::{DebugInfoArea, RequestHeader, RequestPacket, DEBUG_PREFIX_MAX, REQUEST_MAGIC};
pub use response::{DebugInfoTrailer, ResponsePacket, TaskStatus, RESPONSE_MAGIC};

use thiserror::Error;

/// Errors at the packet boundary.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("peer closed the connection")]
    ConnectionClosed,

    #[error("timed out waiting for the peer")]
    Timeout,

    #[error("frame of {len} bytes exceeds the {max}-byte limit")]
    FrameTooLarge { len: u32, max: u32 },

    #[error("packet truncated: needed {needed} bytes, had {had}")]
    Truncated { needed: usize, had: usize },

    #[error("invalid id in request packet: {found:#010x}")]
    BadMagic { found: u32 },

    #[error("unknown task code {0}")]
    UnknownTaskCode(u16),

    #[error("body encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("body decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod property_tests;
