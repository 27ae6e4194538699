// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console command grammar.
//!
//! Tokens are case-insensitive; runs of spaces collapse before matching.
//! Unknown commands parse to an error reply and touch nothing.

use rdgate_core::ShutdownState;

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Shutdown { how: ShutdownState },
    ShutdownWorker { target: WorkerTarget, how: ShutdownState },
    Abort,
    AbortWorker { target: WorkerTarget },
    Display { what: DisplayWhat },
    SetServerReceiveTimeout(u32),
    SetServerSendTimeout(u32),
    SetDebugLevel(u32),
    Clear { targets: Vec<ClearTarget> },
    Cycle { which: CycleTarget },
    Turn { flag: TraceFlag, on: bool },
    Help,
}

/// A worker named by decimal socket id or by database thread name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerTarget {
    SocketId(u64),
    ThreadName(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayWhat {
    Status,
    All,
    Configuration,
    Workers,
    Worker(WorkerTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearTarget {
    Clients,
    Requests,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFlag {
    Brief,
    Detail,
    Internal,
    Sql,
}

impl TraceFlag {
    pub fn bit(self) -> u32 {
        use rdgate_core::DebugFlags;
        match self {
            Self::Brief => DebugFlags::BRIEF,
            Self::Detail => DebugFlags::DETAIL,
            Self::Internal => DebugFlags::INTERNAL,
            Self::Sql => DebugFlags::SQL,
        }
    }
}

/// Collapse runs of spaces and trim, preserving token case for the
/// caller that needs raw text.
pub fn normalize(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse one console line. `Err` carries the reply text to send back.
pub fn parse(line: &str) -> Result<Command, String> {
    let normalized = normalize(line);
    let tokens: Vec<String> = normalized
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_uppercase())
        .collect();
    let words: Vec<&str> = tokens.iter().map(String::as_str).collect();

    match words.split_first() {
        None => Err("invalid command (empty)".to_string()),
        Some((&"SHUTDOWN", rest)) => parse_shutdown(rest),
        Some((&"TERM", rest)) => parse_term(rest),
        Some((&"ABORT", rest)) => parse_abort(rest),
        Some((&"DISPLAY", rest)) => match rest.split_first() {
            Some((&"STATUS", what)) => parse_display(what),
            _ => Err("invalid command: DISPLAY expects STATUS".to_string()),
        },
        Some((&"STATUS", rest)) => parse_display(rest),
        Some((&"SET", rest)) => parse_set(rest),
        Some((&"CLEAR", rest)) => parse_clear(rest),
        Some((&"CYCLE", rest)) => parse_cycle(rest),
        Some((&"TURN", rest)) => parse_turn(rest),
        Some((&"HELP", [])) => Ok(Command::Help),
        Some((other, _)) => Err(format!("invalid command: {other}")),
    }
}

fn how_token(token: &str) -> Option<ShutdownState> {
    match token {
        "GR" | "GRACEFULLY" => Some(ShutdownState::Gracefully),
        "IM" | "IMMEDIATELY" => Some(ShutdownState::Immediately),
        _ => None,
    }
}

fn parse_shutdown(rest: &[&str]) -> Result<Command, String> {
    match rest {
        // Bare SHUTDOWN is graceful.
        [] => Ok(Command::Shutdown {
            how: ShutdownState::Gracefully,
        }),
        [how] => how_token(how)
            .map(|how| Command::Shutdown { how })
            .ok_or_else(|| format!("invalid shutdown command: {how}")),
        ["WORKER", target] => Ok(Command::ShutdownWorker {
            target: worker_target(target),
            how: ShutdownState::Gracefully,
        }),
        ["WORKER", target, how] => how_token(how)
            .map(|how| Command::ShutdownWorker {
                target: worker_target(target),
                how,
            })
            .ok_or_else(|| format!("invalid shutdown worker command: {how}")),
        _ => Err("invalid shutdown command".to_string()),
    }
}

fn parse_term(rest: &[&str]) -> Result<Command, String> {
    match rest {
        // Bare TERM is immediate.
        [] => Ok(Command::Shutdown {
            how: ShutdownState::Immediately,
        }),
        [how] => how_token(how)
            .map(|how| Command::Shutdown { how })
            .ok_or_else(|| format!("invalid term command: {how}")),
        _ => Err("invalid term command".to_string()),
    }
}

fn parse_abort(rest: &[&str]) -> Result<Command, String> {
    match rest {
        [] => Ok(Command::Abort),
        ["WORKER", target] => Ok(Command::AbortWorker {
            target: worker_target(target),
        }),
        _ => Err("invalid abort command".to_string()),
    }
}

fn parse_display(rest: &[&str]) -> Result<Command, String> {
    let what = match rest {
        [] => DisplayWhat::Status,
        ["ALL"] => DisplayWhat::All,
        ["CONFIGURATION"] => DisplayWhat::Configuration,
        ["WORKERS"] => DisplayWhat::Workers,
        ["WORKER", target] => DisplayWhat::Worker(worker_target(target)),
        _ => return Err("invalid display command".to_string()),
    };
    Ok(Command::Display { what })
}

fn parse_set(rest: &[&str]) -> Result<Command, String> {
    match rest {
        ["SERVER", "RECEIVE", "TIMEOUT", n] => parse_ms(n).map(Command::SetServerReceiveTimeout),
        ["SERVER", "SEND", "TIMEOUT", n] => parse_ms(n).map(Command::SetServerSendTimeout),
        ["COMAPI", "DEBUG", "ON"] => Ok(Command::SetDebugLevel(2)),
        ["COMAPI", "DEBUG", "OFF"] => Ok(Command::SetDebugLevel(0)),
        ["DEBUG", "LEVEL", n] => parse_ms(n).map(Command::SetDebugLevel),
        _ => Err("invalid set command".to_string()),
    }
}

fn parse_ms(token: &str) -> Result<u32, String> {
    token
        .parse::<u32>()
        .map_err(|_| format!("invalid numeric value: {token}"))
}

fn parse_clear(rest: &[&str]) -> Result<Command, String> {
    if rest.is_empty() {
        return Err("invalid clear command: no counters named".to_string());
    }
    let mut targets = Vec::new();
    for token in rest {
        let target = match *token {
            "CLIENTS" => ClearTarget::Clients,
            "REQUESTS" => ClearTarget::Requests,
            "ALL" => ClearTarget::All,
            other => return Err(format!("invalid counter: {other}")),
        };
        targets.push(target);
    }
    Ok(Command::Clear { targets })
}

fn parse_cycle(rest: &[&str]) -> Result<Command, String> {
    match rest {
        ["LOGFILE"] => Ok(Command::Cycle {
            which: CycleTarget::LogFile,
        }),
        ["TRACEFILE"] => Ok(Command::Cycle {
            which: CycleTarget::TraceFile,
        }),
        _ => Err("invalid cycle command".to_string()),
    }
}

fn parse_turn(rest: &[&str]) -> Result<Command, String> {
    let (flag, on) = match rest {
        [flag, "ON"] => (flag, true),
        [flag, "OFF"] => (flag, false),
        _ => return Err("invalid turn command".to_string()),
    };
    let flag = match *flag {
        "BRIEF" => TraceFlag::Brief,
        "DETAIL" => TraceFlag::Detail,
        "INTERNAL" => TraceFlag::Internal,
        "SQL" => TraceFlag::Sql,
        other => return Err(format!("invalid trace flag: {other}")),
    };
    Ok(Command::Turn { flag, on })
}

fn worker_target(token: &str) -> WorkerTarget {
    if token.chars().all(|c| c.is_ascii_digit()) {
        match token.parse::<u64>() {
            Ok(id) => WorkerTarget::SocketId(id),
            Err(_) => WorkerTarget::ThreadName(token.to_string()),
        }
    } else {
        WorkerTarget::ThreadName(token.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleTarget {
    LogFile,
    TraceFile,
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
