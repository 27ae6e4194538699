// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::UserAccessControl;
use crate::test_support::{sgs_with_config, TestSgs};
use crate::uasm::AccessTable;
use rdgate_wire::{BeginThreadBody, DebugInfoArea, ErrorBody, UseridPasswordBody};
use std::sync::atomic::Ordering;

fn leased_wde(t: &TestSgs) -> Arc<Wde> {
    t.sgs
        .pool
        .lease(11, "127.0.0.1:50001".parse().unwrap(), 'A', t.sgs.now_ms())
        .unwrap_or_else(|| panic!("no free worker"))
}

fn begin_body() -> BeginThreadBody {
    BeginThreadBody {
        user_id: "TESTER".to_string(),
        password: "pw".to_string(),
        access: rdgate_wire::AccessKind::Update,
        client_level: "2.1".to_string(),
        locale: None,
        keep_alive: None,
        autocommit: false,
    }
}

async fn run_packet(
    t: &TestSgs,
    wde: &Arc<Wde>,
    session: &mut SessionCtx,
    packet: RequestPacket,
) -> TaskOutcome {
    let bytes = packet.encode().unwrap();
    process_task(&t.sgs, wde, session, &bytes).await
}

#[tokio::test]
async fn bad_magic_answers_invalid_request_id_and_keeps_the_channel() {
    let t = sgs_with_config("");
    let wde = leased_wde(&t);
    let mut session = SessionCtx::new(&t.sgs);

    let mut bytes = RequestPacket::without_body(TaskCode::KeepAlive)
        .encode()
        .unwrap();
    bytes[0] ^= 0xFF;

    let outcome = process_task(&t.sgs, &wde, &mut session, &bytes).await;
    assert_eq!(outcome.response.status, TaskStatus::INVALID_REQUEST_ID);
    assert!(outcome.keep_channel);
    let body: ErrorBody = outcome.response.body().unwrap();
    assert!(body.message.contains("invalid id"));
}

#[tokio::test]
async fn unknown_task_code_echoes_the_code() {
    let t = sgs_with_config("");
    let wde = leased_wde(&t);
    let mut session = SessionCtx::new(&t.sgs);

    let mut bytes = RequestPacket::without_body(TaskCode::KeepAlive)
        .encode()
        .unwrap();
    bytes[4] = 0x7F;
    bytes[5] = 0x01;

    let outcome = process_task(&t.sgs, &wde, &mut session, &bytes).await;
    assert_eq!(outcome.response.status, TaskStatus::UNKNOWN_TASK_CODE);
    assert_eq!(outcome.response.task_code, 0x7F01);
    assert!(outcome.keep_channel);
}

#[tokio::test]
async fn accounting_stamps_counters_and_timestamps() {
    let t = sgs_with_config("");
    let wde = leased_wde(&t);
    let mut session = SessionCtx::new(&t.sgs);
    wde.first_request_ms.store(0, Ordering::Relaxed);

    let outcome = run_packet(
        &t,
        &wde,
        &mut session,
        RequestPacket::without_body(TaskCode::KeepAlive),
    )
    .await;
    assert!(outcome.response.status.is_ok());

    assert_eq!(t.sgs.counters.requests.load(Ordering::Relaxed), 1);
    assert_eq!(
        t.sgs.counters.last_task_code.load(Ordering::Relaxed),
        TaskCode::KeepAlive.as_u16() as u32
    );
    assert!(wde.first_request_ms.load(Ordering::Relaxed) > 0);
    assert_eq!(
        wde.task_code.load(Ordering::Relaxed),
        TaskCode::KeepAlive.as_u16() as u32
    );

    // The first-request stamp survives the second request.
    let first = wde.first_request_ms.load(Ordering::Relaxed);
    run_packet(
        &t,
        &wde,
        &mut session,
        RequestPacket::without_body(TaskCode::KeepAlive),
    )
    .await;
    assert_eq!(wde.first_request_ms.load(Ordering::Relaxed), first);
    assert_eq!(t.sgs.counters.requests.load(Ordering::Relaxed), 2);
}

#[tokio::test]
async fn demanded_trace_opens_a_file_and_trailers_once() {
    let t = sgs_with_config("");
    let wde = leased_wde(&t);
    let mut session = SessionCtx::new(&t.sgs);

    let packet = RequestPacket::without_body(TaskCode::KeepAlive)
        .with_debug(
            rdgate_core::DebugFlags::empty().with(rdgate_core::DebugFlags::DETAIL),
            "c1.",
        )
        .with_debug_info(DebugInfoArea {
            trace_file_name: Some("[default]3".to_string()),
            erase_trace_file: false,
        });
    let outcome = run_packet(&t, &wde, &mut session, packet.clone()).await;

    let trailer = outcome.response.trailer.unwrap();
    assert_eq!(trailer.trace_file_name, "RDGATE*trc-3");
    assert_eq!(trailer.generated_run_id, t.sgs.generated_run_id.as_str());
    assert_eq!(t.sgs.client_traces.lock().refcount("RDGATE*trc-3"), Some(1));

    // Already open: no second open, no trailer.
    let outcome = run_packet(&t, &wde, &mut session, packet).await;
    assert!(outcome.response.trailer.is_none());
    assert_eq!(t.sgs.client_traces.lock().refcount("RDGATE*trc-3"), Some(1));
}

#[tokio::test]
async fn operator_debug_level_forces_trace_without_client_flags() {
    let t = sgs_with_config("");
    let wde = leased_wde(&t);
    let mut session = SessionCtx::new(&t.sgs);

    t.sgs.post_debug_level(1);
    t.sgs.take_posted(0);

    let outcome = run_packet(
        &t,
        &wde,
        &mut session,
        RequestPacket::without_body(TaskCode::KeepAlive),
    )
    .await;
    // Operator-forced detail opened a default-named trace file.
    assert!(outcome.response.trailer.is_some());
    assert_eq!(t.sgs.client_traces.lock().len(), 1);
}

#[tokio::test]
async fn xa_token_mismatch_rejects_non_opener_tasks() {
    let t = sgs_with_config("");
    let wde = leased_wde(&t);
    let mut session = SessionCtx::new(&t.sgs);

    let begin = RequestPacket::new(TaskCode::XaBeginThread, &begin_body())
        .unwrap()
        .with_xa_token(0xAAAA);
    let outcome = run_packet(&t, &wde, &mut session, begin).await;
    assert!(outcome.response.status.is_ok());

    // A different token may not run a statement task.
    let execute = RequestPacket::new(
        TaskCode::Execute,
        &rdgate_wire::ExecuteBody {
            sql: "SELECT 1".to_string(),
            params: Vec::new(),
            batch: Vec::new(),
            section: None,
            want_section: false,
            drop_cursor: None,
        },
    )
    .unwrap()
    .with_xa_token(0xBBBB);
    let outcome = run_packet(&t, &wde, &mut session, execute).await;
    assert_eq!(outcome.response.status, TaskStatus::XA_TOKEN_MISMATCH);
    assert!(outcome.keep_channel);

    // A begin-thread with the new token is legal.
    let rebegin = RequestPacket::new(TaskCode::XaBeginThread, &begin_body())
        .unwrap()
        .with_xa_token(0xBBBB);
    let outcome = run_packet(&t, &wde, &mut session, rebegin).await;
    assert!(outcome.response.status.is_ok());
}

#[tokio::test]
async fn failed_credentials_check_closes_the_channel() {
    let t = sgs_with_config("");
    *t.sgs.access.lock() = AccessTable::from_text(UserAccessControl::Jdbc, "OPER1 secret\n");
    let wde = leased_wde(&t);
    let mut session = SessionCtx::new(&t.sgs);

    let packet = RequestPacket::new(
        TaskCode::UseridPassword,
        &UseridPasswordBody {
            user_id: "OPER1".to_string(),
            password: "wrong".to_string(),
        },
    )
    .unwrap();
    let outcome = run_packet(&t, &wde, &mut session, packet).await;
    assert_eq!(outcome.response.status, TaskStatus::ACCESS_DENIED);
    assert!(!outcome.keep_channel);
    assert!(!wde.working_on_client.load(Ordering::Acquire));
}

#[tokio::test]
async fn engine_errors_keep_the_channel_for_statement_tasks() {
    let t = sgs_with_config("");
    let wde = leased_wde(&t);
    let mut session = SessionCtx::new(&t.sgs);

    // No thread open: the engine status rides in the response.
    let packet = RequestPacket::new(
        TaskCode::Execute,
        &rdgate_wire::ExecuteBody {
            sql: "SELECT 1".to_string(),
            params: Vec::new(),
            batch: Vec::new(),
            section: None,
            want_section: false,
            drop_cursor: None,
        },
    )
    .unwrap();
    let outcome = run_packet(&t, &wde, &mut session, packet).await;
    assert_eq!(
        outcome.response.status,
        TaskStatus::engine(rdgate_engine::EngineError::NO_SUCH_THREAD)
    );
    assert!(outcome.keep_channel);
    assert!(wde.working_on_client.load(Ordering::Acquire));
}
