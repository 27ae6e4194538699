// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request packets: fixed binary header + JSON task body + optional
//! debug-info area.

use crate::ProtocolError;
use rdgate_core::{DebugFlags, TaskCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// First word of every request packet. A different value means the peer is
/// not speaking this protocol (or this version of it).
pub const REQUEST_MAGIC: u32 = u32::from_be_bytes(*b"RGQ1");

/// The debug prefix identifies the client-side object instance in trace
/// output. Longer prefixes are truncated at encode time.
pub const DEBUG_PREFIX_MAX: usize = 64;

/// Decoded fixed header of a request packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    pub task_code: TaskCode,
    pub debug_flags: DebugFlags,
    pub debug_prefix: String,
    pub xa_token: u64,
}

/// Client-supplied trace routing, carried past the body when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfoArea {
    /// Requested server-side trace file name (one of the four recognised
    /// forms; see the dispatcher's resolution rules).
    pub trace_file_name: Option<String>,
    /// Open the trace file with erase rather than append.
    #[serde(default)]
    pub erase_trace_file: bool,
}

/// A complete request packet.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPacket {
    pub header: RequestHeader,
    pub body: Vec<u8>,
    pub debug_info: Option<DebugInfoArea>,
}

impl RequestPacket {
    /// Build a packet with a JSON-encoded body.
    pub fn new<B: Serialize>(task_code: TaskCode, body: &B) -> Result<Self, ProtocolError> {
        let body = serde_json::to_vec(body).map_err(ProtocolError::Encode)?;
        Ok(Self {
            header: RequestHeader {
                task_code,
                debug_flags: DebugFlags::empty(),
                debug_prefix: String::new(),
                xa_token: 0,
            },
            body,
            debug_info: None,
        })
    }

    /// Build a packet with an empty body (end-thread, commit, keep-alive).
    pub fn without_body(task_code: TaskCode) -> Self {
        Self {
            header: RequestHeader {
                task_code,
                debug_flags: DebugFlags::empty(),
                debug_prefix: String::new(),
                xa_token: 0,
            },
            body: Vec::new(),
            debug_info: None,
        }
    }

    pub fn with_debug(mut self, flags: DebugFlags, prefix: impl Into<String>) -> Self {
        self.header.debug_flags = flags;
        let mut prefix = prefix.into();
        prefix.truncate(DEBUG_PREFIX_MAX);
        self.header.debug_prefix = prefix;
        self
    }

    pub fn with_debug_info(mut self, area: DebugInfoArea) -> Self {
        self.debug_info = Some(area);
        self
    }

    pub fn with_xa_token(mut self, token: u64) -> Self {
        self.header.xa_token = token;
        self
    }

    /// Decode the JSON body into a task-specific type.
    pub fn body<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_slice(&self.body).map_err(ProtocolError::Decode)
    }

    /// Serialize into packet bytes (header, body, optional debug area).
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let debug_info = match &self.debug_info {
            Some(area) => Some(serde_json::to_vec(area).map_err(ProtocolError::Encode)?),
            None => None,
        };

        let prefix = self.header.debug_prefix.as_bytes();
        let prefix_len = prefix.len().min(DEBUG_PREFIX_MAX);
        let header_len = 4 + 2 + 4 + 1 + prefix_len + 4 + 8 + 4;
        let debug_offset = match &debug_info {
            Some(_) => (header_len + self.body.len()) as u32,
            None => 0,
        };

        let mut bytes = Vec::with_capacity(
            header_len + self.body.len() + debug_info.as_ref().map_or(0, Vec::len),
        );
        bytes.extend_from_slice(&REQUEST_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&self.header.task_code.as_u16().to_be_bytes());
        bytes.extend_from_slice(&self.header.debug_flags.bits().to_be_bytes());
        bytes.push(prefix_len as u8);
        bytes.extend_from_slice(&prefix[..prefix_len]);
        bytes.extend_from_slice(&debug_offset.to_be_bytes());
        bytes.extend_from_slice(&self.header.xa_token.to_be_bytes());
        bytes.extend_from_slice(&(self.body.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.body);
        if let Some(area) = debug_info {
            bytes.extend_from_slice(&area);
        }
        Ok(bytes)
    }

    /// Decode packet bytes. Magic is checked before anything else so the
    /// dispatcher can synthesise its invalid-request-id response.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut reader = Reader::new(bytes);
        let magic = reader.u32()?;
        if magic != REQUEST_MAGIC {
            return Err(ProtocolError::BadMagic { found: magic });
        }
        let raw_task = reader.u16()?;
        let task_code =
            TaskCode::from_u16(raw_task).ok_or(ProtocolError::UnknownTaskCode(raw_task))?;
        let debug_flags = DebugFlags(reader.u32()?);
        let prefix_len = reader.u8()? as usize;
        let debug_prefix = String::from_utf8_lossy(reader.bytes(prefix_len)?).into_owned();
        let debug_offset = reader.u32()?;
        let xa_token = reader.u64()?;
        let body_len = reader.u32()? as usize;
        let body = reader.bytes(body_len)?.to_vec();

        let debug_info = if debug_offset == 0 {
            None
        } else {
            let area = bytes
                .get(debug_offset as usize..)
                .ok_or(ProtocolError::Truncated {
                    needed: debug_offset as usize,
                    had: bytes.len(),
                })?;
            Some(serde_json::from_slice(area).map_err(ProtocolError::Decode)?)
        };

        Ok(Self {
            header: RequestHeader {
                task_code,
                debug_flags,
                debug_prefix,
                xa_token,
            },
            body,
            debug_info,
        })
    }
}

/// Sequential big-endian reader over packet bytes.
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    at: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, at: 0 }
    }

    pub(crate) fn bytes(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        let end = self.at.checked_add(n).ok_or(ProtocolError::Truncated {
            needed: usize::MAX,
            had: self.bytes.len(),
        })?;
        let slice = self
            .bytes
            .get(self.at..end)
            .ok_or(ProtocolError::Truncated {
                needed: end,
                had: self.bytes.len(),
            })?;
        self.at = end;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.bytes(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, ProtocolError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, ProtocolError> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn i32(&mut self) -> Result<i32, ProtocolError> {
        let b = self.bytes(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn u64(&mut self) -> Result<u64, ProtocolError> {
        let b = self.bytes(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
