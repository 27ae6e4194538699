// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration: a line-oriented `key = value ;` file parsed at startup.
//!
//! Three passes: syntactic ([`parse`]), missing-parameter defaulting, and
//! cross-field semantic validation (both in [`validate`]). Errors abort
//! startup; warnings continue with the defaulted value.

mod parse;
mod validate;

pub use parse::{parse, Assignment};

use rdgate_core::KeepAlivePolicy;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors are fatal at startup (exit code 1).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line_no}: {reason}")]
    Syntax { line_no: usize, reason: String },

    #[error("line {line_no}: unknown keyword {key:?}")]
    UnknownKey { line_no: usize, key: String },

    #[error("{key}: {reason}")]
    BadValue { key: &'static str, reason: String },

    #[error("required parameter {key} is missing")]
    Missing { key: &'static str },

    #[error("{0}")]
    Semantic(String),
}

/// One listen address specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenHost {
    /// Empty or "0": listen on every local interface.
    Any,
    Addr(IpAddr),
    /// A DNS name, resolved at listen time.
    Name(String),
}

impl ListenHost {
    pub fn parse(token: &str) -> Result<Self, String> {
        let token = token.trim();
        if token.is_empty() || token == "0" {
            return Ok(Self::Any);
        }
        // IPv6 literals are detected by ':'; dotted quads parse as V4.
        if token.contains(':') || token.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return token
                .parse::<IpAddr>()
                .map(Self::Addr)
                .map_err(|e| format!("bad listen address {token:?}: {e}"));
        }
        if token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            Ok(Self::Name(token.to_string()))
        } else {
            Err(format!("bad host name {token:?}"))
        }
    }
}

impl std::fmt::Display for ListenHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "0"),
            Self::Addr(addr) => write!(f, "{addr}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

/// User-access control mode for the security monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserAccessControl {
    #[default]
    Off,
    Jdbc,
    JdbcSecopt1,
    Fund,
    JdbcFundamental,
}

impl UserAccessControl {
    pub fn enabled(self) -> bool {
        self != Self::Off
    }
}

impl FromStr for UserAccessControl {
    type Err = String;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "jdbc" => Ok(Self::Jdbc),
            "jdbc_secopt1" => Ok(Self::JdbcSecopt1),
            "fund" => Ok(Self::Fund),
            "jdbc_fundamental" => Ok(Self::JdbcFundamental),
            _ => Err(format!("unknown user_access_control value {token:?}")),
        }
    }
}

/// Scheduling priority requested for the server run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ServerPriority {
    Txn,
    #[default]
    User,
    Batch,
    Demand,
    /// `LEVEL$,nnnnnnnn` pass-through.
    Level(String),
}

impl FromStr for ServerPriority {
    type Err = String;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.to_ascii_lowercase().as_str() {
            "txn" => Ok(Self::Txn),
            "user" => Ok(Self::User),
            "batch" => Ok(Self::Batch),
            "demand" => Ok(Self::Demand),
            other => {
                if let Some(level) = other.strip_prefix("level$,") {
                    if !level.is_empty() && level.len() <= 8 && level.chars().all(|c| c.is_ascii_digit()) {
                        return Ok(Self::Level(level.to_string()));
                    }
                }
                Err(format!("unknown server_priority value {token:?}"))
            }
        }
    }
}

/// One listener slot: a host spec crossed with a transport-mode letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IclEndpoint {
    pub number: usize,
    pub host: ListenHost,
    pub mode: char,
}

/// The validated configuration installed into SGS at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub server_name: String,
    pub max_activities: u32,
    pub max_queued_clients: u32,
    pub app_group_name: String,
    pub app_group_number: u32,
    pub host_port: u16,
    pub listen_hosts: Vec<ListenHost>,
    pub transport_modes: Vec<char>,
    pub thread_name_prefix: String,
    pub keep_alive: KeepAlivePolicy,
    pub server_receive_timeout_ms: u32,
    pub server_send_timeout_ms: u32,
    pub worker_receive_timeout_ms: u32,
    pub client_receive_timeout_ms: u32,
    pub trace_qualifier: String,
    pub trace_file_max_tracks: u32,
    pub trace_file_max_cycles: u32,
    pub server_locale: String,
    pub keyin_id: String,
    pub user_access: UserAccessControl,
    pub server_priority: ServerPriority,
    pub log_console_output: bool,
    pub rsa_bdi: u32,
    pub uds_icr_bdi: u32,
    pub xa_thread_reuse: u32,
    pub server_log_file: Option<PathBuf>,
    pub server_trace_file: Option<PathBuf>,
    pub reconnect_retry_wait: Duration,
    pub reconnect_tries: u32,
}

impl ServerConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_text(&text)
    }

    /// Parse and validate configuration text.
    pub fn from_text(text: &str) -> Result<Self, ConfigError> {
        let assignments = parse::parse(text)?;
        validate::build(assignments)
    }

    /// The listener slots this configuration calls for: each listen host
    /// crossed with each transport mode, numbered in order.
    pub fn icl_endpoints(&self) -> Vec<IclEndpoint> {
        let mut endpoints = Vec::new();
        for host in &self.listen_hosts {
            for mode in &self.transport_modes {
                endpoints.push(IclEndpoint {
                    number: endpoints.len(),
                    host: host.clone(),
                    mode: *mode,
                });
            }
        }
        endpoints
    }

    /// Receive timeout the client side of a connection runs with.
    pub fn effective_client_receive_timeout_ms(&self) -> u32 {
        if self.client_receive_timeout_ms == 0 {
            self.server_receive_timeout_ms
        } else {
            self.client_receive_timeout_ms
        }
    }
}
