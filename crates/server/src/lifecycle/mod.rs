// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server lifecycle: startup, the shutdown wait, and exit codes.

mod startup;
pub use startup::startup;

use crate::config::ConfigError;
use crate::sgs::ServerGlobalState;
use rdgate_core::ShutdownState;
use std::fs::File;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

/// Lifecycle errors map onto the documented exit codes.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not create required files: {0}")]
    CreateFiles(#[source] std::io::Error),

    #[error("could not delete stale files: {0}")]
    DeleteStale(#[source] std::io::Error),

    #[error("could not acquire server lock (another instance running?): {0}")]
    LockFailed(#[source] std::io::Error),
}

impl LifecycleError {
    /// Exit codes: 0 normal shutdown, 1 configuration error, 2 could not
    /// create required files, 3 could not delete stale files.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 1,
            Self::NoStateDir | Self::CreateFiles(_) | Self::LockFailed(_) => 2,
            Self::DeleteStale(_) => 3,
        }
    }
}

/// Filesystem layout for one server instance.
#[derive(Debug, Clone)]
pub struct ServerPaths {
    pub state_dir: PathBuf,
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
    pub trace_path: PathBuf,
}

impl ServerPaths {
    /// Resolve under the environment's state directory, honouring the
    /// configured log/trace file overrides.
    pub fn resolve(config: &crate::config::ServerConfig) -> Result<Self, LifecycleError> {
        let state_dir = crate::env::state_dir()?;
        Ok(Self::under(config, state_dir))
    }

    /// Resolve under an explicit state directory.
    pub fn under(config: &crate::config::ServerConfig, state_dir: PathBuf) -> Self {
        let log_path = config
            .server_log_file
            .clone()
            .unwrap_or_else(|| state_dir.join("server.log"));
        let trace_path = config
            .server_trace_file
            .clone()
            .unwrap_or_else(|| state_dir.join("server.trc"));
        Self {
            lock_path: state_dir.join("rdgated.pid"),
            log_path,
            trace_path,
            state_dir,
        }
    }
}

/// A running server instance.
pub struct Server {
    pub sgs: Arc<ServerGlobalState>,
    pub(crate) tasks: Vec<JoinHandle<()>>,
    // NOTE(lifetime): held to keep the exclusive PID lock; released on drop
    #[allow(dead_code)]
    pub(crate) lock_file: File,
}

impl Server {
    /// The address a listener actually bound, once it has.
    pub async fn listen_addr(&self, icl_number: usize) -> Option<SocketAddr> {
        for _ in 0..400 {
            if let Some(addr) = *self.sgs.icls.get(icl_number)?.bound.lock() {
                return Some(addr);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        None
    }

    /// Block until a shutdown completes: the state machine has advanced
    /// past active, every listener has terminated, and the assigned chain
    /// has drained.
    pub async fn wait_for_shutdown(&self) {
        loop {
            tokio::select! {
                _ = self.sgs.shutdown_notify.notified() => {}
                _ = tokio::time::sleep(Duration::from_millis(200)) => {}
            }

            if self.sgs.server_shutdown() == ShutdownState::Active {
                continue;
            }
            let listeners_done = self
                .sgs
                .icls
                .iter()
                .all(|slot| slot.shutdown_state() == ShutdownState::Terminated);
            if listeners_done && self.sgs.pool.counts().assigned == 0 {
                break;
            }
        }

        // Stop the console handler and the security monitor, then mark the
        // machine terminated.
        self.sgs.set_uasm_shutdown(ShutdownState::Immediately);
        self.sgs.set_console_shutdown(ShutdownState::Gracefully);
        for _ in 0..50 {
            if self.sgs.console_shutdown() == ShutdownState::Terminated {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.sgs.advance_server_shutdown(ShutdownState::Terminated);
        info!("server shutdown complete");
    }

    /// Tear down: stop remaining activities and remove the instance files.
    pub fn shutdown(self) {
        self.sgs.log_message("server shutdown complete");
        for task in &self.tasks {
            task.abort();
        }
        let _ = std::fs::remove_file(&self.sgs.keyin_socket_path);
        let _ = std::fs::remove_file(self.sgs.state_dir.join("rdgated.pid"));
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
