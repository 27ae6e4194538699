// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefix framing over any async byte stream.

use crate::ProtocolError;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on one frame. Response packets carry at most one fetch block
/// plus the debug trailer, which fits comfortably below this.
pub const MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

/// Read one length-prefixed frame.
///
/// A clean EOF before the prefix (or mid-frame) is `ConnectionClosed`. When
/// `timeout` is given, exceeding it yields `Timeout`; the stream is left in
/// an undefined mid-read position and must not be reused for framing.
pub async fn read_frame<R>(
    reader: &mut R,
    timeout: Option<Duration>,
) -> Result<Vec<u8>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, read_frame_inner(reader))
            .await
            .map_err(|_| ProtocolError::Timeout)?,
        None => read_frame_inner(reader).await,
    }
}

async fn read_frame_inner<R>(reader: &mut R) -> Result<Vec<u8>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; 4];
    if let Err(e) = reader.read_exact(&mut prefix).await {
        return Err(closed_or_io(e));
    }
    let len = u32::from_be_bytes(prefix);
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge {
            len,
            max: MAX_FRAME_BYTES,
        });
    }
    let mut payload = vec![0u8; len as usize];
    if let Err(e) = reader.read_exact(&mut payload).await {
        return Err(closed_or_io(e));
    }
    Ok(payload)
}

/// Write one length-prefixed frame and flush it.
pub async fn write_frame<W>(
    writer: &mut W,
    payload: &[u8],
    timeout: Option<Duration>,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, write_frame_inner(writer, payload))
            .await
            .map_err(|_| ProtocolError::Timeout)?,
        None => write_frame_inner(writer, payload).await,
    }
}

async fn write_frame_inner<W>(writer: &mut W, payload: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len()).map_err(|_| ProtocolError::FrameTooLarge {
        len: u32::MAX,
        max: MAX_FRAME_BYTES,
    })?;
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge {
            len,
            max: MAX_FRAME_BYTES,
        });
    }
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

fn closed_or_io(e: std::io::Error) -> ProtocolError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        ProtocolError::ConnectionClosed
    } else {
        ProtocolError::Io(e)
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
