// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::body::{ErrorBody, RowsBody};
use rdgate_core::sql::{ColumnDesc, Row, RowBlock, SqlValue};
use rdgate_core::TaskCode;

fn one_row_block() -> RowBlock {
    RowBlock {
        columns: vec![ColumnDesc::new("C1", "INTEGER")],
        rows: vec![Row(vec![SqlValue::Int(1)])],
        end_of_data: true,
    }
}

#[test]
fn encode_decode_round_trip() {
    let body = RowsBody {
        block: one_row_block(),
    };
    let packet = ResponsePacket::ok(TaskCode::Next.as_u16(), &body).unwrap();
    let bytes = packet.encode().unwrap();
    let back = ResponsePacket::decode(&bytes).unwrap();

    assert_eq!(back, packet);
    assert!(back.status.is_ok());
    assert_eq!(back.task_code, TaskCode::Next.as_u16());
    let decoded: RowsBody = back.body().unwrap();
    assert_eq!(decoded.block, one_row_block());
}

#[test]
fn trailer_round_trip() {
    let packet = ResponsePacket::empty(TaskCode::Execute.as_u16()).with_trailer(DebugInfoTrailer {
        trace_file_name: "TRC*GATE-1".to_string(),
        generated_run_id: "AB12CD".to_string(),
    });
    let bytes = packet.encode().unwrap();
    let back = ResponsePacket::decode(&bytes).unwrap();
    let trailer = back.trailer.unwrap();
    assert_eq!(trailer.trace_file_name, "TRC*GATE-1");
    assert_eq!(trailer.generated_run_id, "AB12CD");
}

#[test]
fn error_response_carries_code_and_message() {
    let packet = ResponsePacket::error(
        TaskCode::Execute.as_u16(),
        TaskStatus::INVALID_REQUEST_ID,
        "invalid id in request packet",
    );
    let bytes = packet.encode().unwrap();
    let back = ResponsePacket::decode(&bytes).unwrap();
    assert_eq!(back.status, TaskStatus::INVALID_REQUEST_ID);
    let body: ErrorBody = back.body().unwrap();
    assert_eq!(body.code, TaskStatus::INVALID_REQUEST_ID.0);
    assert!(body.message.contains("invalid id"));
}

#[test]
fn unknown_task_codes_echo_raw() {
    let packet = ResponsePacket::error(0xFFFF, TaskStatus::UNKNOWN_TASK_CODE, "unknown task");
    let bytes = packet.encode().unwrap();
    let back = ResponsePacket::decode(&bytes).unwrap();
    assert_eq!(back.task_code, 0xFFFF);
}

#[test]
fn wrong_magic_is_bad_magic() {
    let packet = ResponsePacket::empty(TaskCode::Next.as_u16());
    let mut bytes = packet.encode().unwrap();
    bytes[3] ^= 0x55;
    assert!(matches!(
        ResponsePacket::decode(&bytes),
        Err(ProtocolError::BadMagic { .. })
    ));
}

#[test]
fn engine_statuses_pass_through() {
    let status = TaskStatus::engine(6025);
    assert_eq!(status.0, 6025);
    assert!(!status.is_ok());
}
