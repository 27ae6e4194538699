// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The receive/send contract between workers and the network.
//!
//! Terminal conditions on receive, in precedence order: peer closed
//! (lost client), user event (out-of-band wake-up), then any other
//! transport status. A timed-out receive leaves the socket open; a
//! timed-out send is a lost client.

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;

/// How many identical consecutive reconnect errors are logged before
/// suppression kicks in. Further repeats stay quiet until a different
/// status appears.
pub const RECONNECT_ERRORS_LOGGED: u32 = 5;

/// Largest request frame a worker will accept.
pub const MAX_REQUEST_BYTES: u32 = rdgate_wire::MAX_FRAME_BYTES;

/// Why a receive returned without data.
#[derive(Debug)]
pub enum RecvStatus {
    /// Peer closed the connection (or the transport says it is gone).
    LostClient,
    /// The worker's event channel fired; check shutdown state.
    UserEvent,
    /// The receive timeout elapsed. The socket stays open.
    TimedOut,
    /// The frame length prefix exceeds the allowed maximum.
    Oversized(u32),
    /// Any other transport status.
    Io(std::io::Error),
}

/// Receive exactly `len` bytes.
///
/// A request of zero bytes returns success immediately, without touching
/// the transport. Short reads loop until the requested length is
/// satisfied or a terminal condition is seen.
pub async fn receive_exact<R>(
    reader: &mut R,
    len: usize,
    event: &Notify,
    timeout: Option<Duration>,
) -> Result<Vec<u8>, RecvStatus>
where
    R: AsyncRead + Unpin,
{
    if len == 0 {
        return Ok(Vec::new());
    }

    let mut buffer = vec![0u8; len];
    let read_all = async {
        match reader.read_exact(&mut buffer).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(RecvStatus::LostClient),
            Err(e) => Err(RecvStatus::Io(e)),
        }
    };

    match timeout {
        Some(limit) => {
            tokio::select! {
                outcome = read_all => outcome.map(|()| buffer),
                _ = event.notified() => Err(RecvStatus::UserEvent),
                _ = tokio::time::sleep(limit) => Err(RecvStatus::TimedOut),
            }
        }
        None => {
            tokio::select! {
                outcome = read_all => outcome.map(|()| buffer),
                _ = event.notified() => Err(RecvStatus::UserEvent),
            }
        }
    }
}

/// Receive one length-prefixed request frame under the receive contract.
pub async fn receive_frame<R>(
    reader: &mut R,
    event: &Notify,
    timeout: Option<Duration>,
) -> Result<Vec<u8>, RecvStatus>
where
    R: AsyncRead + Unpin,
{
    let prefix = receive_exact(reader, 4, event, timeout).await?;
    let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
    if len > MAX_REQUEST_BYTES {
        return Err(RecvStatus::Oversized(len));
    }
    receive_exact(reader, len as usize, event, timeout).await
}

/// Why a send failed.
#[derive(Debug)]
pub enum SendStatus {
    /// Timeout or closed peer: the client is treated as lost.
    LostClient,
    Io(std::io::Error),
}

/// Send one length-prefixed frame. A timeout on send is a lost client.
pub async fn send_frame<W>(
    writer: &mut W,
    payload: &[u8],
    timeout: Option<Duration>,
) -> Result<(), SendStatus>
where
    W: AsyncWrite + Unpin,
{
    let write_all = async {
        let len = payload.len() as u32;
        writer.write_all(&len.to_be_bytes()).await?;
        writer.write_all(payload).await?;
        writer.flush().await
    };

    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, write_all).await {
            Ok(outcome) => outcome,
            Err(_) => return Err(SendStatus::LostClient),
        },
        None => write_all.await,
    };

    outcome.map_err(|e| {
        if matches!(
            e.kind(),
            std::io::ErrorKind::BrokenPipe
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::UnexpectedEof
        ) {
            SendStatus::LostClient
        } else {
            SendStatus::Io(e)
        }
    })
}

/// Close a client socket.
///
/// Socket ids of zero or below mean "no socket": those close successfully
/// without any transport call.
pub fn close_socket(socket_id: i64, stream: Option<TcpStream>) -> i32 {
    if socket_id <= 0 {
        return 0;
    }
    drop(stream);
    0
}

/// Repeated-error log suppression for the listener reconnect loop.
///
/// The first [`RECONNECT_ERRORS_LOGGED`] occurrences of an identical
/// consecutive status are loggable; later repeats are not, until a
/// different status resets the counter.
#[derive(Debug, Default)]
pub struct StatusSuppressor {
    last_status: i32,
    seen: u32,
}

impl StatusSuppressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a status; returns whether it should be logged.
    pub fn should_log(&mut self, status: i32) -> bool {
        if status == self.last_status {
            self.seen = self.seen.saturating_add(1);
        } else {
            self.last_status = status;
            self.seen = 1;
        }
        self.seen <= RECONNECT_ERRORS_LOGGED
    }

    /// How many times the current status has repeated.
    pub fn seen(&self) -> u32 {
        self.seen
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
