// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::sgs_with_config;

fn lease(sgs: &Arc<ServerGlobalState>, socket_id: u64) -> Arc<Wde> {
    sgs.pool
        .lease(
            socket_id,
            "127.0.0.1:40000".parse().unwrap(),
            'A',
            sgs.now_ms(),
        )
        .unwrap_or_else(|| panic!("no free worker"))
}

#[tokio::test]
async fn graceful_transition_fans_out() {
    let t = sgs_with_config("");
    let sgs = Arc::clone(&t.sgs);
    let wde = lease(&sgs, 7);

    let reply = shutdown_server(&sgs, ShutdownState::Gracefully);
    assert!(reply.contains("shutdown initiated"));

    assert_eq!(sgs.server_shutdown(), ShutdownState::Gracefully);
    assert_eq!(sgs.icls[0].shutdown_state(), ShutdownState::Gracefully);
    assert_eq!(sgs.uasm_shutdown(), ShutdownState::Gracefully);
    assert_eq!(wde.shutdown_state(), ShutdownState::Gracefully);
}

#[tokio::test]
async fn immediate_upgrades_graceful_workers() {
    let t = sgs_with_config("");
    let sgs = Arc::clone(&t.sgs);
    let wde = lease(&sgs, 7);

    shutdown_server(&sgs, ShutdownState::Gracefully);
    assert_eq!(wde.shutdown_state(), ShutdownState::Gracefully);

    shutdown_server(&sgs, ShutdownState::Immediately);
    assert_eq!(sgs.server_shutdown(), ShutdownState::Immediately);
    assert_eq!(wde.shutdown_state(), ShutdownState::Immediately);
    assert_eq!(sgs.icls[0].shutdown_state(), ShutdownState::Immediately);
}

#[tokio::test]
async fn transitions_never_go_backwards() {
    let t = sgs_with_config("");
    let sgs = Arc::clone(&t.sgs);

    shutdown_server(&sgs, ShutdownState::Immediately);
    let reply = shutdown_server(&sgs, ShutdownState::Gracefully);
    assert!(reply.contains("already"));
    assert_eq!(sgs.server_shutdown(), ShutdownState::Immediately);
}

#[tokio::test]
async fn worker_targeted_shutdown_finds_by_socket_and_thread() {
    let t = sgs_with_config("");
    let sgs = Arc::clone(&t.sgs);
    let wde = lease(&sgs, 55);
    wde.client.lock().thread_name = "RG0055".to_string();

    let reply = shutdown_worker(
        &sgs,
        &WorkerTarget::SocketId(55),
        ShutdownState::Gracefully,
    );
    assert!(reply.contains("worker"));
    assert_eq!(wde.shutdown_state(), ShutdownState::Gracefully);

    let reply = shutdown_worker(
        &sgs,
        &WorkerTarget::ThreadName("RG0055".to_string()),
        ShutdownState::Immediately,
    );
    assert!(reply.contains("worker"));
    assert_eq!(wde.shutdown_state(), ShutdownState::Immediately);
}

#[tokio::test]
async fn missing_worker_replies_not_found() {
    let t = sgs_with_config("");
    let reply = shutdown_worker(
        &t.sgs,
        &WorkerTarget::SocketId(999),
        ShutdownState::Gracefully,
    );
    assert!(reply.contains("no assigned worker"));
}

#[tokio::test]
async fn prepare_abort_terminates_every_word() {
    let t = sgs_with_config("");
    let sgs = Arc::clone(&t.sgs);
    let wde = lease(&sgs, 3);

    prepare_abort(&sgs);

    assert_eq!(sgs.server_shutdown(), ShutdownState::Terminated);
    assert_eq!(sgs.icls[0].shutdown_state(), ShutdownState::Terminated);
    assert_eq!(sgs.uasm_shutdown(), ShutdownState::Terminated);
    assert_eq!(sgs.console_shutdown(), ShutdownState::Terminated);
    assert_eq!(wde.shutdown_state(), ShutdownState::Immediately);
    let log = std::fs::read_to_string(t.dir.path().join("server.log")).unwrap();
    assert!(log.contains("ABORT"));
}
