// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-key validation, defaulting, and the cross-field semantic pass.

use super::parse::Assignment;
use super::{ConfigError, ListenHost, ServerConfig, ServerPriority, UserAccessControl};
use rdgate_core::KeepAlivePolicy;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

const MAX_ACTIVITIES_LIMIT: i64 = 4096;
const MAX_TIMEOUT_MS: i64 = 86_400_000;
const MAX_SERVER_NAME: usize = 32;
const MAX_APP_GROUP_NAME: usize = 12;

fn defaults() -> ServerConfig {
    ServerConfig {
        server_name: "RDGATE".to_string(),
        max_activities: 16,
        max_queued_clients: 16,
        app_group_name: String::new(),
        app_group_number: 1,
        host_port: 7544,
        listen_hosts: vec![ListenHost::Any],
        transport_modes: vec!['A'],
        thread_name_prefix: "RG".to_string(),
        keep_alive: KeepAlivePolicy::DefaultOff,
        server_receive_timeout_ms: 900_000,
        server_send_timeout_ms: 120_000,
        worker_receive_timeout_ms: 900_000,
        client_receive_timeout_ms: 0,
        trace_qualifier: "RDGATE".to_string(),
        trace_file_max_tracks: 2000,
        trace_file_max_cycles: 5,
        server_locale: "en".to_string(),
        keyin_id: "RUNID".to_string(),
        user_access: UserAccessControl::Off,
        server_priority: ServerPriority::User,
        log_console_output: false,
        rsa_bdi: 0,
        uds_icr_bdi: 0,
        xa_thread_reuse: 100,
        server_log_file: None,
        server_trace_file: None,
        reconnect_retry_wait: Duration::from_secs(10),
        reconnect_tries: 720,
    }
}

/// Build a validated configuration from parsed assignments.
pub fn build(assignments: Vec<Assignment>) -> Result<ServerConfig, ConfigError> {
    let mut config = defaults();
    let mut saw_app_group = false;

    for assignment in assignments {
        let Assignment {
            line_no,
            key,
            value,
        } = assignment;
        match key.as_str() {
            "server_name" => {
                config.server_name = bounded_string("server_name", &value, MAX_SERVER_NAME)?;
            }
            "max_activities" => {
                config.max_activities =
                    int_in_range("max_activities", &value, 1, MAX_ACTIVITIES_LIMIT)? as u32;
            }
            "max_queued_comapi" => {
                config.max_queued_clients =
                    int_in_range("max_queued_comapi", &value, 0, MAX_ACTIVITIES_LIMIT)? as u32;
            }
            "app_group_name" => {
                config.app_group_name =
                    bounded_string("app_group_name", &value, MAX_APP_GROUP_NAME)?;
                saw_app_group = true;
            }
            "app_group_number" => {
                config.app_group_number = int_in_range("app_group_number", &value, 1, 64)? as u32;
            }
            "host_port" => {
                config.host_port = int_in_range("host_port", &value, 0, u16::MAX as i64)? as u16;
            }
            "server_listens_on" => {
                config.listen_hosts = listen_hosts(&value)?;
            }
            "rdms_threadname_prefix" => {
                if value.is_empty()
                    || value.len() > 2
                    || !value.chars().all(|c| c.is_ascii_alphanumeric())
                {
                    return Err(ConfigError::BadValue {
                        key: "rdms_threadname_prefix",
                        reason: "must be 1-2 alphanumeric characters".to_string(),
                    });
                }
                config.thread_name_prefix = value.to_ascii_uppercase();
            }
            "client_keep_alive" => {
                config.keep_alive = value.parse().map_err(|e| ConfigError::BadValue {
                    key: "client_keep_alive",
                    reason: format!("{e}"),
                })?;
            }
            "server_receive_timeout" => {
                config.server_receive_timeout_ms =
                    int_in_range("server_receive_timeout", &value, 0, MAX_TIMEOUT_MS)? as u32;
            }
            "server_send_timeout" => {
                config.server_send_timeout_ms =
                    int_in_range("server_send_timeout", &value, 0, MAX_TIMEOUT_MS)? as u32;
            }
            "server_activity_receive_timeout" => {
                config.worker_receive_timeout_ms = int_in_range(
                    "server_activity_receive_timeout",
                    &value,
                    0,
                    MAX_TIMEOUT_MS,
                )? as u32;
            }
            "client_receive_timeout" => {
                config.client_receive_timeout_ms =
                    int_in_range("client_receive_timeout", &value, 0, MAX_TIMEOUT_MS)? as u32;
            }
            "client_default_tracefile_qualifier" => {
                config.trace_qualifier =
                    bounded_string("client_default_tracefile_qualifier", &value, 12)?
                        .to_ascii_uppercase();
            }
            "client_tracefile_max_trks" => {
                config.trace_file_max_tracks =
                    int_in_range("client_tracefile_max_trks", &value, 1, 262_143)? as u32;
            }
            "client_tracefile_max_cycles" => {
                config.trace_file_max_cycles =
                    int_in_range("client_tracefile_max_cycles", &value, 1, 32)? as u32;
            }
            "server_locale" => {
                config.server_locale = bounded_string("server_locale", &value, 16)?;
            }
            "keyin_id" => {
                config.keyin_id = keyin_id(&value)?;
            }
            "user_access_control" => {
                config.user_access = value.parse().map_err(|reason| ConfigError::BadValue {
                    key: "user_access_control",
                    reason,
                })?;
            }
            "server_priority" => {
                config.server_priority =
                    value.parse().map_err(|reason| ConfigError::BadValue {
                        key: "server_priority",
                        reason,
                    })?;
            }
            "comapi_modes" => {
                config.transport_modes = transport_modes(&value)?;
            }
            "log_console_output" => {
                config.log_console_output = on_off("log_console_output", &value)?;
            }
            "rsa_bdi" => {
                config.rsa_bdi = octal_or_default("rsa_bdi", &value)?;
            }
            "uds_icr_bdi" => {
                config.uds_icr_bdi = octal_or_default("uds_icr_bdi", &value)?;
            }
            "xa_thread_reuse" => {
                config.xa_thread_reuse =
                    int_in_range("xa_thread_reuse", &value, 1, 1_000_000)? as u32;
            }
            "server_log_file" => {
                config.server_log_file = Some(PathBuf::from(&value));
            }
            "server_trace_file" => {
                config.server_trace_file = Some(PathBuf::from(&value));
            }
            "comapi_server_socket_retry_wait" => {
                let secs = int_in_range("comapi_server_socket_retry_wait", &value, 1, 3600)?;
                config.reconnect_retry_wait = Duration::from_secs(secs as u64);
            }
            "comapi_server_socket_tries" => {
                config.reconnect_tries =
                    int_in_range("comapi_server_socket_tries", &value, 1, 100_000)? as u32;
            }
            _ => {
                return Err(ConfigError::UnknownKey {
                    line_no,
                    key: key.clone(),
                });
            }
        }
    }

    // Missing-parameter pass.
    if !saw_app_group {
        return Err(ConfigError::Missing {
            key: "app_group_name",
        });
    }

    // Cross-field semantic pass.
    if config.max_queued_clients > config.max_activities {
        return Err(ConfigError::Semantic(format!(
            "max_queued_comapi ({}) exceeds max_activities ({})",
            config.max_queued_clients, config.max_activities
        )));
    }
    if config.listen_hosts.len() > 2 {
        return Err(ConfigError::Semantic(
            "server_listens_on allows at most two host specifications".to_string(),
        ));
    }
    if config.icl_endpoints().len() > 4 {
        return Err(ConfigError::Semantic(
            "host specifications x transport modes allows at most four listeners".to_string(),
        ));
    }
    if config.server_send_timeout_ms != 0
        && config.server_receive_timeout_ms != 0
        && config.server_send_timeout_ms > config.server_receive_timeout_ms
    {
        warn!(
            send_ms = config.server_send_timeout_ms,
            receive_ms = config.server_receive_timeout_ms,
            "server_send_timeout exceeds server_receive_timeout; using receive value"
        );
        config.server_send_timeout_ms = config.server_receive_timeout_ms;
    }

    Ok(config)
}

fn int_in_range(key: &'static str, value: &str, min: i64, max: i64) -> Result<i64, ConfigError> {
    let parsed: i64 = value.parse().map_err(|_| ConfigError::BadValue {
        key,
        reason: format!("{value:?} is not an integer"),
    })?;
    if parsed < min || parsed > max {
        return Err(ConfigError::BadValue {
            key,
            reason: format!("{parsed} is outside [{min}, {max}]"),
        });
    }
    Ok(parsed)
}

fn bounded_string(key: &'static str, value: &str, max: usize) -> Result<String, ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::BadValue {
            key,
            reason: "must not be empty".to_string(),
        });
    }
    if value.len() > max {
        return Err(ConfigError::BadValue {
            key,
            reason: format!("longer than {max} characters"),
        });
    }
    Ok(value.to_string())
}

fn on_off(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(ConfigError::BadValue {
            key,
            reason: format!("{value:?} is not on/off"),
        }),
    }
}

fn octal_or_default(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    if value.eq_ignore_ascii_case("default") {
        return Ok(0);
    }
    u32::from_str_radix(value, 8).map_err(|_| ConfigError::BadValue {
        key,
        reason: format!("{value:?} is not an octal number or 'default'"),
    })
}

fn keyin_id(value: &str) -> Result<String, ConfigError> {
    let upper = value.to_ascii_uppercase();
    if upper == "RUNID" {
        return Ok(upper);
    }
    if upper.is_empty()
        || upper.len() > 8
        || !upper.chars().all(|c| c.is_ascii_alphanumeric() || c == '*')
    {
        return Err(ConfigError::BadValue {
            key: "keyin_id",
            reason: "must be 1-8 characters of letters, digits or '*'".to_string(),
        });
    }
    Ok(upper)
}

fn listen_hosts(value: &str) -> Result<Vec<ListenHost>, ConfigError> {
    let tokens: Vec<&str> = value
        .split([',', ' '])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Ok(vec![ListenHost::Any]);
    }
    let mut hosts = Vec::new();
    for token in tokens {
        hosts.push(
            ListenHost::parse(token).map_err(|reason| ConfigError::BadValue {
                key: "server_listens_on",
                reason,
            })?,
        );
    }
    Ok(hosts)
}

fn transport_modes(value: &str) -> Result<Vec<char>, ConfigError> {
    let mut modes = Vec::new();
    for c in value.chars().filter(|c| !c.is_whitespace()) {
        let mode = c.to_ascii_uppercase();
        if !mode.is_ascii_uppercase() {
            return Err(ConfigError::BadValue {
                key: "comapi_modes",
                reason: format!("{c:?} is not a mode letter"),
            });
        }
        if modes.contains(&mode) {
            return Err(ConfigError::BadValue {
                key: "comapi_modes",
                reason: format!("mode {mode:?} appears twice"),
            });
        }
        modes.push(mode);
    }
    if modes.is_empty() {
        return Err(ConfigError::BadValue {
            key: "comapi_modes",
            reason: "at least one mode letter is required".to_string(),
        });
    }
    Ok(modes)
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
