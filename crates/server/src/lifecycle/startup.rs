// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server startup and activity spawn sequence.

use super::{LifecycleError, Server, ServerPaths};
use crate::config::ServerConfig;
use crate::logging::LogFile;
use crate::sgs::ServerGlobalState;
use crate::{console, icl, uasm, worker};
use fs2::FileExt;
use rdgate_core::ShutdownState;
use rdgate_engine::RelationalEngine;
use std::io::Write;
use std::sync::Arc;
use tracing::info;

/// Start the server: establish the instance files, build SGS, and spawn
/// the listener, worker, console and security-monitor activities.
pub async fn startup(
    config: ServerConfig,
    paths: ServerPaths,
    engine: Arc<dyn RelationalEngine>,
) -> Result<Server, LifecycleError> {
    // 1. State directory.
    std::fs::create_dir_all(&paths.state_dir).map_err(LifecycleError::CreateFiles)?;

    // 2. Acquire the PID lock before touching anything shared. Open
    // without truncating so a losing race does not wipe the holder's pid.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&paths.lock_path)
        .map_err(LifecycleError::CreateFiles)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    let mut lock_file = lock_file;
    lock_file.set_len(0).map_err(LifecycleError::CreateFiles)?;
    writeln!(lock_file, "{}", std::process::id()).map_err(LifecycleError::CreateFiles)?;
    let lock_file = lock_file;

    // 3. Open the operator log and trace files.
    let cycles = config.trace_file_max_cycles;
    let log = LogFile::open(&paths.log_path, cycles).map_err(LifecycleError::CreateFiles)?;
    let trace = LogFile::open(&paths.trace_path, cycles).map_err(LifecycleError::CreateFiles)?;

    // 4. Build SGS; this also resolves the keyin name and mints the
    // generated run id.
    let (sgs, receivers) =
        ServerGlobalState::new(config, engine, paths.state_dir.clone(), log, trace);

    // 5. Remove a stale keyin socket from a previous run.
    match std::fs::remove_file(&sgs.keyin_socket_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(LifecycleError::DeleteStale(e)),
    }

    sgs.log_message(&format!(
        "{} starting: level {}, run {} (original {}), engine {}",
        sgs.config.server_name,
        sgs.server_level,
        sgs.generated_run_id,
        sgs.original_run_id,
        sgs.engine_level,
    ));

    let mut tasks = Vec::new();

    // 6. Workers park on their handoff channels before any listener can
    // accept.
    for (id, rx) in receivers {
        let wde = match sgs.pool.wde(id) {
            Some(wde) => Arc::clone(wde),
            None => continue,
        };
        tasks.push(tokio::spawn(worker::run(Arc::clone(&sgs), wde, rx)));
    }

    // 7. One listener per configured transport mode; the first owns
    // shutdown coordination.
    sgs.coordinator_icl
        .store(0, std::sync::atomic::Ordering::Release);
    for icl_number in 0..sgs.icls.len() {
        tasks.push(tokio::spawn(icl::run(Arc::clone(&sgs), icl_number)));
    }

    // 8. Console handler and security monitor.
    tasks.push(tokio::spawn(console::run(Arc::clone(&sgs))));
    tasks.push(tokio::spawn(uasm::run(Arc::clone(&sgs))));

    // 9. SIGTERM drives the same machine as console TERM.
    tasks.push(tokio::spawn(terminate_on_signal(Arc::clone(&sgs))));

    info!(
        server = %sgs.config.server_name,
        run = %sgs.generated_run_id,
        "server started"
    );

    Ok(Server {
        sgs,
        tasks,
        lock_file,
    })
}

/// Map SIGTERM to an immediate shutdown, like a bare console TERM.
async fn terminate_on_signal(sgs: Arc<ServerGlobalState>) {
    let Ok(mut sigterm) =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
    else {
        return;
    };
    if sigterm.recv().await.is_some() {
        sgs.log_message("SIGTERM received; immediate shutdown");
        console::shutdown::shutdown_server(&sgs, ShutdownState::Immediately);
    }
}
