// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rdgated: the gateway server binary.
//!
//! Usage: `rdgated [config-file]`. The configuration path defaults to
//! `rdgate.conf` (or `RDGATE_CONFIG`). Exit codes: 0 normal shutdown,
//! 1 configuration error, 2 could not create required files, 3 could not
//! delete stale files.

use rdgate_engine::MemoryEngine;
use rdgate_server::config::ServerConfig;
use rdgate_server::lifecycle::{self, ServerPaths};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(rdgate_server::env::config_path);

    let config = match ServerConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("rdgated: {}: {e}", config_path.display());
            return ExitCode::from(1);
        }
    };

    let paths = match ServerPaths::resolve(&config) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("rdgated: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    // Diagnostic log (tracing) beside the operator log; stderr gets
    // nothing in normal operation.
    let _guard = match std::fs::create_dir_all(&paths.state_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::never(&paths.state_dir, "rdgated.diag");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        Err(_) => None,
    };

    // The database engine proper is an external collaborator; this build
    // serves the in-memory engine.
    let engine = Arc::new(MemoryEngine::new());

    let server = match lifecycle::startup(config, paths, engine).await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("rdgated: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    server.wait_for_shutdown().await;
    server.shutdown();
    ExitCode::SUCCESS
}
