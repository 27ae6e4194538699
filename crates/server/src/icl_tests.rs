// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::sgs_with_config;
use rdgate_core::ShutdownState;
use std::time::Duration;

async fn wait_for_bound(sgs: &Arc<ServerGlobalState>, icl: usize) -> SocketAddr {
    for _ in 0..200 {
        if let Some(addr) = *sgs.icls[icl].bound.lock() {
            return addr;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("listener never bound");
}

#[tokio::test]
async fn accept_leases_a_worker_and_bequeaths_the_socket() {
    let mut t = sgs_with_config("");
    let sgs = Arc::clone(&t.sgs);
    let task = tokio::spawn(run(Arc::clone(&sgs), 0));

    let addr = wait_for_bound(&sgs, 0).await;
    let _client = TcpStream::connect(addr).await.unwrap();

    let (_, rx) = &mut t.receivers[0];
    let handoff = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(handoff.icl_number, 0);
    assert_eq!(handoff.transport_mode, 'A');
    assert!(handoff.socket_id > 0);

    let counts = sgs.pool.counts();
    assert_eq!(counts.assigned, 1);
    assert_eq!(sgs.counters.clients.load(std::sync::atomic::Ordering::Relaxed), 1);

    sgs.icls[0].set_shutdown(ShutdownState::Immediately);
    sgs.icls[0].notify.notify_one();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn exhausted_pool_turns_clients_away_with_busy_status() {
    let t = sgs_with_config("max_activities = 1 ;\nmax_queued_comapi = 1 ;\n");
    let sgs = Arc::clone(&t.sgs);
    let task = tokio::spawn(run(Arc::clone(&sgs), 0));

    let addr = wait_for_bound(&sgs, 0).await;
    let _first = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sgs.pool.counts().assigned, 1);

    // The second client gets the one-shot server-busy response, then the
    // socket closes.
    let mut second = TcpStream::connect(addr).await.unwrap();
    let frame = rdgate_wire::read_frame(&mut second, Some(Duration::from_secs(2)))
        .await
        .unwrap();
    let response = ResponsePacket::decode(&frame).unwrap();
    assert_eq!(response.status, TaskStatus::SERVER_BUSY);
    let body: rdgate_wire::ErrorBody = response.body().unwrap();
    assert!(body.message.contains("no server worker"));
    let eof = rdgate_wire::read_frame(&mut second, Some(Duration::from_secs(2))).await;
    assert!(matches!(
        eof,
        Err(rdgate_wire::ProtocolError::ConnectionClosed)
    ));

    assert_eq!(sgs.pool.counts().assigned, 1);
    let log = std::fs::read_to_string(t.dir.path().join("server.log")).unwrap();
    assert!(log.contains("no worker available"));

    sgs.icls[0].set_shutdown(ShutdownState::Immediately);
    sgs.icls[0].notify.notify_one();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn user_event_applies_posted_values_without_a_connection() {
    let t = sgs_with_config("");
    let sgs = Arc::clone(&t.sgs);
    let task = tokio::spawn(run(Arc::clone(&sgs), 0));
    wait_for_bound(&sgs, 0).await;

    sgs.post_receive_timeout_ms(777);
    sgs.icls[0].notify.notify_one();

    for _ in 0..200 {
        if !sgs.has_pending_posted_values() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(!sgs.has_pending_posted_values());
    assert_eq!(
        sgs.effective_receive_timeout_ms
            .load(std::sync::atomic::Ordering::Acquire),
        777
    );

    sgs.icls[0].set_shutdown(ShutdownState::Immediately);
    sgs.icls[0].notify.notify_one();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn shutdown_zeroes_the_bound_socket_and_terminates() {
    let t = sgs_with_config("");
    let sgs = Arc::clone(&t.sgs);
    let task = tokio::spawn(run(Arc::clone(&sgs), 0));
    wait_for_bound(&sgs, 0).await;

    sgs.icls[0].set_shutdown(ShutdownState::Gracefully);
    sgs.icls[0].notify.notify_one();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap();

    assert!(sgs.icls[0].bound.lock().is_none());
    assert_eq!(sgs.icls[0].shutdown_state(), ShutdownState::Terminated);
    let log = std::fs::read_to_string(t.dir.path().join("server.log")).unwrap();
    assert!(log.contains("ICL 0: terminated"));
}

#[tokio::test]
async fn reconnect_storm_logs_only_the_first_few_failures() {
    // Occupy a port, then point the ICL at it with fast retries.
    let blocker = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = blocker.local_addr().unwrap().port();

    let t = sgs_with_config(&format!(
        "comapi_server_socket_retry_wait = 1 ;\ncomapi_server_socket_tries = 12 ;\nhost_port = {port} ;\n"
    ));
    let sgs = Arc::clone(&t.sgs);
    let task = tokio::spawn(run(Arc::clone(&sgs), 0));

    // Let several bind attempts fail, then stop the listener.
    tokio::time::sleep(Duration::from_millis(3500)).await;
    sgs.icls[0].set_shutdown(ShutdownState::Immediately);
    sgs.icls[0].notify.notify_one();
    tokio::time::timeout(Duration::from_secs(3), task)
        .await
        .unwrap()
        .unwrap();

    let log = std::fs::read_to_string(t.dir.path().join("server.log")).unwrap();
    let failures = log
        .lines()
        .filter(|l| l.contains("listen socket unavailable"))
        .count();
    assert!(failures >= 1, "expected at least one logged failure");
    assert!(
        failures <= crate::transport::RECONNECT_ERRORS_LOGGED as usize,
        "suppression failed: {failures} failures logged"
    );
    drop(blocker);
}
