// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Framing tests: length prefix, EOF mapping, size limit.

use super::*;

#[tokio::test]
async fn frame_round_trip() {
    let payload = b"gateway payload";
    let mut buffer = Vec::new();
    write_frame(&mut buffer, payload, None).await.unwrap();

    assert_eq!(buffer.len(), 4 + payload.len());
    assert_eq!(
        u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize,
        payload.len()
    );

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_frame(&mut cursor, None).await.unwrap();
    assert_eq!(read_back, payload);
}

#[tokio::test]
async fn empty_frame_is_legal() {
    let mut buffer = Vec::new();
    write_frame(&mut buffer, b"", None).await.unwrap();
    let mut cursor = std::io::Cursor::new(buffer);
    assert!(read_frame(&mut cursor, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn eof_before_prefix_is_connection_closed() {
    let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
    match read_frame(&mut cursor, None).await {
        Err(ProtocolError::ConnectionClosed) => {}
        other => panic!("expected ConnectionClosed, got {other:?}"),
    }
}

#[tokio::test]
async fn eof_mid_frame_is_connection_closed() {
    let mut bytes = 100u32.to_be_bytes().to_vec();
    bytes.extend_from_slice(b"short");
    let mut cursor = std::io::Cursor::new(bytes);
    match read_frame(&mut cursor, None).await {
        Err(ProtocolError::ConnectionClosed) => {}
        other => panic!("expected ConnectionClosed, got {other:?}"),
    }
}

#[tokio::test]
async fn oversized_prefix_is_rejected_without_allocating() {
    let bytes = (MAX_FRAME_BYTES + 1).to_be_bytes().to_vec();
    let mut cursor = std::io::Cursor::new(bytes);
    match read_frame(&mut cursor, None).await {
        Err(ProtocolError::FrameTooLarge { len, .. }) => {
            assert_eq!(len, MAX_FRAME_BYTES + 1);
        }
        other => panic!("expected FrameTooLarge, got {other:?}"),
    }
}

#[tokio::test]
async fn read_timeout_fires() {
    // A duplex pipe with no writer activity never produces a prefix.
    let (mut rx, _tx) = tokio::io::duplex(64);
    match read_frame(&mut rx, Some(std::time::Duration::from_millis(20))).await {
        Err(ProtocolError::Timeout) => {}
        other => panic!("expected Timeout, got {other:?}"),
    }
}
