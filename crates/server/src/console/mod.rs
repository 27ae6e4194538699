// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console Handler.
//!
//! The operator keyin surface is a Unix-domain socket named after the
//! registered keyin name in the state directory. Each accepted connection
//! is one operator session: lines in, replies out. Replies mirror to the
//! server log when `log_console_output` is on.

pub mod command;
pub mod display;
pub mod shutdown;

pub use command::{parse, Command};

use crate::messages::{localized, MsgId};
use crate::sgs::ServerGlobalState;
use command::{ClearTarget, CycleTarget};
use rdgate_core::ShutdownState;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

/// A reply plus whether the command demands process termination.
pub struct ConsoleReply {
    pub text: String,
    pub abort: bool,
}

/// The console handler activity.
pub async fn run(sgs: Arc<ServerGlobalState>) {
    // Register the keyin name. A stale socket from a previous run is
    // deregistered first so register-deregister-register always works.
    let _ = std::fs::remove_file(&sgs.keyin_socket_path);
    let listener = match UnixListener::bind(&sgs.keyin_socket_path) {
        Ok(listener) => listener,
        Err(e) => {
            // Losing the keyin surface is fatal: force immediate shutdown.
            sgs.log_message(&format!(
                "console keyin registration failed: {e}; forcing immediate shutdown"
            ));
            warn!(error = %e, "keyin registration failed");
            shutdown::shutdown_server(&sgs, ShutdownState::Immediately);
            sgs.set_console_shutdown(ShutdownState::Terminated);
            return;
        }
    };
    sgs.log_message(&format!(
        "console keyin registered as {} ({})",
        sgs.keyin_name,
        sgs.keyin_socket_path.display()
    ));
    info!(keyin = %sgs.keyin_name, "console handler ready");

    loop {
        if sgs.console_shutdown() != ShutdownState::Active {
            break;
        }
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    if handle_session(&sgs, stream).await {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "console accept failed");
                }
            },
            _ = sgs.console_notify.notified() => {}
        }
    }

    drop(listener);
    let _ = std::fs::remove_file(&sgs.keyin_socket_path);
    sgs.set_console_shutdown(ShutdownState::Terminated);
    sgs.log_message("console handler terminated");
    sgs.shutdown_notify.notify_waiters();
}

/// Serve one operator session. Returns true when the handler should stop
/// (an ABORT was processed).
async fn handle_session(sgs: &Arc<ServerGlobalState>, stream: UnixStream) -> bool {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let reply = execute_line(sgs, &line);
        let mut text = reply.text.clone();
        text.push('\n');
        if writer.write_all(text.as_bytes()).await.is_err() {
            break;
        }
        if reply.abort {
            // ABORT: control does not return to the accept loop.
            let _ = writer.flush().await;
            shutdown::abort_server(sgs);
        }
        if sgs.console_shutdown() != ShutdownState::Active {
            return true;
        }
    }
    false
}

/// Parse and execute one console line.
pub fn execute_line(sgs: &Arc<ServerGlobalState>, line: &str) -> ConsoleReply {
    debug!(line, "console command received");
    let reply = match parse(line) {
        Ok(command) => execute(sgs, command),
        Err(reason) => ConsoleReply {
            text: format!(
                "{}: {reason}",
                localized(&sgs.config.server_locale, MsgId::InvalidCommand)
            ),
            abort: false,
        },
    };
    if sgs.config.log_console_output {
        let first_line = reply.text.lines().next().unwrap_or_default();
        sgs.log_message(&format!(
            "console: {} -> {first_line}",
            command::normalize(line)
        ));
    }
    reply
}

fn execute(sgs: &Arc<ServerGlobalState>, command: Command) -> ConsoleReply {
    let text = match command {
        Command::Shutdown { how } => shutdown::shutdown_server(sgs, how),
        Command::ShutdownWorker { target, how } => shutdown::shutdown_worker(sgs, &target, how),
        Command::Abort => {
            return ConsoleReply {
                text: "server aborting".to_string(),
                abort: true,
            };
        }
        Command::AbortWorker { target } => {
            shutdown::shutdown_worker(sgs, &target, ShutdownState::Immediately)
        }
        Command::Display { what } => display::render(sgs, &what),
        Command::SetServerReceiveTimeout(ms) => {
            sgs.post_receive_timeout_ms(ms);
            sgs.notify_all_icls();
            format!("server receive timeout posted: {ms} ms")
        }
        Command::SetServerSendTimeout(ms) => {
            sgs.post_send_timeout_ms(ms);
            sgs.notify_all_icls();
            format!("server send timeout posted: {ms} ms")
        }
        Command::SetDebugLevel(level) => {
            sgs.post_debug_level(level);
            sgs.notify_all_icls();
            format!("debug level posted: {level}")
        }
        Command::Clear { targets } => {
            for target in &targets {
                match target {
                    ClearTarget::Clients => sgs.clear_client_counter(),
                    ClearTarget::Requests => sgs.clear_request_counters(),
                    ClearTarget::All => {
                        sgs.clear_client_counter();
                        sgs.clear_request_counters();
                    }
                }
            }
            "counters cleared".to_string()
        }
        Command::Cycle { which } => {
            let result = match which {
                CycleTarget::LogFile => sgs.log.lock().cycle(),
                CycleTarget::TraceFile => sgs.trace.lock().cycle(),
            };
            match result {
                Ok(()) => "file cycled".to_string(),
                Err(e) => format!("cycle failed: {e}"),
            }
        }
        Command::Turn { flag, on } => {
            sgs.turn_debug_flag(flag.bit(), on);
            format!(
                "trace flag {:?} {}",
                flag,
                if on { "on" } else { "off" }
            )
        }
        Command::Help => help_text(),
    };
    ConsoleReply { text, abort: false }
}

fn help_text() -> String {
    [
        "SHUTDOWN [GR|IM]                 stop the server",
        "SHUTDOWN WORKER id|tid [GR|IM]   stop one worker",
        "TERM [GR|IM]                     synonym; bare TERM is immediate",
        "ABORT | ABORT WORKER id|tid      forceful stop",
        "DISPLAY STATUS [ALL|CONFIGURATION|WORKERS|WORKER id]",
        "SET SERVER RECEIVE TIMEOUT ms | SET SERVER SEND TIMEOUT ms",
        "SET COMAPI DEBUG ON|OFF | SET DEBUG LEVEL n",
        "CLEAR CLIENTS|REQUESTS|ALL       reset counters",
        "CYCLE LOGFILE|TRACEFILE          rotate a server file",
        "TURN BRIEF|DETAIL|INTERNAL|SQL ON|OFF",
        "HELP",
    ]
    .join("\n")
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
