// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response packets: fixed binary header + JSON task body + optional
//! debug-info trailer naming the server-side trace file.

use crate::request::Reader;
use crate::ProtocolError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// First word of every response packet.
pub const RESPONSE_MAGIC: u32 = u32::from_be_bytes(*b"RGR1");

/// Numeric task status carried in every response header.
///
/// Zero is success. The 53xx block is reserved for gateway-detected
/// failures; anything else is an engine status passed through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskStatus(pub i32);

impl TaskStatus {
    pub const OK: Self = Self(0);
    /// The request packet's first word was not the request magic.
    pub const INVALID_REQUEST_ID: Self = Self(5330);
    pub const UNKNOWN_TASK_CODE: Self = Self(5331);
    pub const INTERNAL_ERROR: Self = Self(5332);
    pub const SERVER_BUSY: Self = Self(5333);
    pub const TRACE_FILE_OPEN_FAILED: Self = Self(5334);
    pub const TRACE_FILE_CLOSE_FAILED: Self = Self(5335);
    /// Non-transactional client accessing a transactional server.
    pub const XA_TOKEN_MISMATCH: Self = Self(5336);
    pub const ACCESS_DENIED: Self = Self(5337);
    pub const SHUTDOWN_IN_PROGRESS: Self = Self(5338);
    pub const BAD_REQUEST_BODY: Self = Self(5339);

    /// Wrap an engine status code unchanged.
    pub fn engine(code: i32) -> Self {
        Self(code)
    }

    pub fn is_ok(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trailer appended when this request opened a server-side trace file, so
/// the client can name it in its own diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfoTrailer {
    pub trace_file_name: String,
    pub generated_run_id: String,
}

/// A complete response packet.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsePacket {
    pub status: TaskStatus,
    /// Echo of the request's task code; raw, so unknown codes echo too.
    pub task_code: u16,
    pub body: Vec<u8>,
    pub trailer: Option<DebugInfoTrailer>,
}

impl ResponsePacket {
    /// Build a success response with a JSON body.
    pub fn ok<B: Serialize>(task_code: u16, body: &B) -> Result<Self, ProtocolError> {
        let body = serde_json::to_vec(body).map_err(ProtocolError::Encode)?;
        Ok(Self {
            status: TaskStatus::OK,
            task_code,
            body,
            trailer: None,
        })
    }

    /// Build a response with no body (commit, keep-alive, end-thread).
    pub fn empty(task_code: u16) -> Self {
        Self {
            status: TaskStatus::OK,
            task_code,
            body: Vec::new(),
            trailer: None,
        }
    }

    /// Build an error response carrying a localized message body.
    pub fn error(task_code: u16, status: TaskStatus, message: impl Into<String>) -> Self {
        let body = crate::body::ErrorBody {
            code: status.0,
            message: message.into(),
        };
        // An ErrorBody of two plain fields always encodes.
        let body = serde_json::to_vec(&body).unwrap_or_default();
        Self {
            status,
            task_code,
            body,
            trailer: None,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_trailer(mut self, trailer: DebugInfoTrailer) -> Self {
        self.trailer = Some(trailer);
        self
    }

    /// Decode the JSON body into a task-specific type.
    pub fn body<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_slice(&self.body).map_err(ProtocolError::Decode)
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let trailer = match &self.trailer {
            Some(t) => Some(serde_json::to_vec(t).map_err(ProtocolError::Encode)?),
            None => None,
        };

        let header_len = 4 + 4 + 2 + 4 + 4;
        let trailer_offset = match &trailer {
            Some(_) => (header_len + self.body.len()) as u32,
            None => 0,
        };

        let mut bytes =
            Vec::with_capacity(header_len + self.body.len() + trailer.as_ref().map_or(0, Vec::len));
        bytes.extend_from_slice(&RESPONSE_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&self.status.0.to_be_bytes());
        bytes.extend_from_slice(&self.task_code.to_be_bytes());
        bytes.extend_from_slice(&trailer_offset.to_be_bytes());
        bytes.extend_from_slice(&(self.body.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.body);
        if let Some(t) = trailer {
            bytes.extend_from_slice(&t);
        }
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut reader = Reader::new(bytes);
        let magic = reader.u32()?;
        if magic != RESPONSE_MAGIC {
            return Err(ProtocolError::BadMagic { found: magic });
        }
        let status = TaskStatus(reader.i32()?);
        let task_code = reader.u16()?;
        let trailer_offset = reader.u32()?;
        let body_len = reader.u32()? as usize;
        let body = reader.bytes(body_len)?.to_vec();

        let trailer = if trailer_offset == 0 {
            None
        } else {
            let t = bytes
                .get(trailer_offset as usize..)
                .ok_or(ProtocolError::Truncated {
                    needed: trailer_offset as usize,
                    had: bytes.len(),
                })?;
            Some(serde_json::from_slice(t).map_err(ProtocolError::Decode)?)
        };

        Ok(Self {
            status,
            task_code,
            body,
            trailer,
        })
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
