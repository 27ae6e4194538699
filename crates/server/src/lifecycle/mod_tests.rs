// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::ServerConfig;
use crate::console;
use crate::test_support::test_config_text;
use rdgate_engine::MemoryEngine;

fn test_paths(dir: &tempfile::TempDir, config: &ServerConfig) -> ServerPaths {
    ServerPaths::under(config, dir.path().to_path_buf())
}

fn config() -> ServerConfig {
    ServerConfig::from_text(&test_config_text("")).unwrap()
}

async fn start(dir: &tempfile::TempDir) -> Server {
    let config = config();
    let paths = test_paths(dir, &config);
    startup(config, paths, Arc::new(MemoryEngine::new()))
        .await
        .unwrap()
}

#[tokio::test]
async fn startup_establishes_instance_files_and_listeners() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(&dir).await;

    assert!(dir.path().join("rdgated.pid").exists());
    assert!(dir.path().join("server.log").exists());
    let addr = server.listen_addr(0).await.unwrap();
    assert!(addr.port() > 0);

    // The keyin socket registered.
    for _ in 0..200 {
        if server.sgs.keyin_socket_path.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(server.sgs.keyin_socket_path.exists());

    console::shutdown::shutdown_server(&server.sgs, ShutdownState::Immediately);
    server.wait_for_shutdown().await;
    server.shutdown();
}

#[tokio::test]
async fn second_instance_fails_to_lock() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(&dir).await;

    let config = config();
    let paths = test_paths(&dir, &config);
    let second = startup(config, paths, Arc::new(MemoryEngine::new())).await;
    match second {
        Err(LifecycleError::LockFailed(_)) => {}
        other => panic!("expected LockFailed, got {:?}", other.map(|_| ())),
    }

    console::shutdown::shutdown_server(&server.sgs, ShutdownState::Immediately);
    server.wait_for_shutdown().await;
    server.shutdown();
}

#[tokio::test]
async fn stale_keyin_socket_is_deregistered_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    // A previous run left a socket file behind under the same keyin name.
    let config = config();
    let original = crate::env::original_run_id();
    let stale = dir.path().join(format!("{original}.keyin"));
    std::fs::write(&stale, b"").unwrap();

    let paths = test_paths(&dir, &config);
    let server = startup(config, paths, Arc::new(MemoryEngine::new()))
        .await
        .unwrap();

    // The console handler re-registered over the stale file.
    for _ in 0..200 {
        if server.sgs.keyin_socket_path.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(server.sgs.keyin_socket_path.exists());

    console::shutdown::shutdown_server(&server.sgs, ShutdownState::Immediately);
    server.wait_for_shutdown().await;
    server.shutdown();
}

// Exit-code mapping for the documented codes.
#[test]
fn exit_codes_match_the_contract() {
    use crate::config::ConfigError;
    assert_eq!(
        LifecycleError::Config(ConfigError::Missing { key: "app_group_name" }).exit_code(),
        1
    );
    assert_eq!(
        LifecycleError::CreateFiles(std::io::Error::new(std::io::ErrorKind::Other, "x"))
            .exit_code(),
        2
    );
    assert_eq!(
        LifecycleError::DeleteStale(std::io::Error::new(std::io::ErrorKind::Other, "x"))
            .exit_code(),
        3
    );
}
