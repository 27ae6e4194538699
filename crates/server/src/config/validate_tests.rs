// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::super::{ConfigError, ListenHost, ServerConfig, ServerPriority, UserAccessControl};
use rdgate_core::KeepAlivePolicy;
use yare::parameterized;

fn minimal() -> &'static str {
    "app_group_name = UDSSRC ;\n"
}

fn with_lines(extra: &str) -> Result<ServerConfig, ConfigError> {
    ServerConfig::from_text(&format!("{}{}", minimal(), extra))
}

#[test]
fn minimal_config_takes_defaults() {
    let config = ServerConfig::from_text(minimal()).unwrap();
    assert_eq!(config.app_group_name, "UDSSRC");
    assert_eq!(config.server_name, "RDGATE");
    assert_eq!(config.max_activities, 16);
    assert_eq!(config.host_port, 7544);
    assert_eq!(config.listen_hosts, vec![ListenHost::Any]);
    assert_eq!(config.transport_modes, vec!['A']);
    assert_eq!(config.keep_alive, KeepAlivePolicy::DefaultOff);
    assert_eq!(config.user_access, UserAccessControl::Off);
    assert_eq!(config.server_priority, ServerPriority::User);
    assert_eq!(config.xa_thread_reuse, 100);
}

#[test]
fn missing_app_group_is_an_error() {
    assert!(matches!(
        ServerConfig::from_text("host_port = 7544 ;\n"),
        Err(ConfigError::Missing {
            key: "app_group_name"
        })
    ));
}

#[test]
fn unknown_keyword_is_an_error() {
    match with_lines("no_such_key = 1 ;\n") {
        Err(ConfigError::UnknownKey { key, .. }) => assert_eq!(key, "no_such_key"),
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[parameterized(
    zero = { "0", ListenHost::Any },
    v4 = { "192.168.7.10", ListenHost::Addr("192.168.7.10".parse().unwrap()) },
    v6 = { "::1", ListenHost::Addr("::1".parse().unwrap()) },
    name = { "db-host.example.com", ListenHost::Name("db-host.example.com".to_string()) },
)]
fn listen_host_forms(token: &str, host: ListenHost) {
    let config = with_lines(&format!("server_listens_on = {token} ;\n")).unwrap();
    assert_eq!(config.listen_hosts, vec![host]);
}

#[test]
fn two_hosts_and_two_modes_make_four_listeners() {
    let config =
        with_lines("server_listens_on = 127.0.0.1 ::1 ;\ncomapi_modes = AB ;\n").unwrap();
    let endpoints = config.icl_endpoints();
    assert_eq!(endpoints.len(), 4);
    assert_eq!(endpoints[0].number, 0);
    assert_eq!(endpoints[3].number, 3);
    assert_eq!(endpoints[1].mode, 'B');
}

#[test]
fn three_hosts_are_rejected() {
    assert!(matches!(
        with_lines("server_listens_on = 10.0.0.1 10.0.0.2 10.0.0.3 ;\n"),
        Err(ConfigError::Semantic(_))
    ));
}

#[test]
fn duplicate_mode_letters_are_rejected() {
    assert!(matches!(
        with_lines("comapi_modes = AA ;\n"),
        Err(ConfigError::BadValue {
            key: "comapi_modes",
            ..
        })
    ));
}

#[test]
fn queued_clients_cannot_exceed_workers() {
    assert!(matches!(
        with_lines("max_activities = 2 ;\nmax_queued_comapi = 5 ;\n"),
        Err(ConfigError::Semantic(_))
    ));
}

#[parameterized(
    too_small = { "max_activities = 0 ;\n" },
    too_large = { "max_activities = 100000 ;\n" },
    not_a_number = { "max_activities = many ;\n" },
)]
fn out_of_range_integers_are_rejected(line: &str) {
    assert!(matches!(
        with_lines(line),
        Err(ConfigError::BadValue {
            key: "max_activities",
            ..
        })
    ));
}

#[test]
fn thread_prefix_must_be_short_alnum() {
    assert!(with_lines("rdms_threadname_prefix = ABC ;\n").is_err());
    assert!(with_lines("rdms_threadname_prefix = a! ;\n").is_err());
    let config = with_lines("rdms_threadname_prefix = g1 ;\n").unwrap();
    assert_eq!(config.thread_name_prefix, "G1");
}

#[test]
fn octal_bdi_values_parse() {
    let config = with_lines("rsa_bdi = 0201515 ;\nuds_icr_bdi = default ;\n").unwrap();
    assert_eq!(config.rsa_bdi, 0o201515);
    assert_eq!(config.uds_icr_bdi, 0);
}

#[test]
fn keyin_id_rules() {
    assert_eq!(with_lines("keyin_id = gate7 ;\n").unwrap().keyin_id, "GATE7");
    assert_eq!(with_lines("keyin_id = RUNID ;\n").unwrap().keyin_id, "RUNID");
    assert!(with_lines("keyin_id = toolongname ;\n").is_err());
}

#[test]
fn client_receive_timeout_falls_back_to_server_value() {
    let config = with_lines("server_receive_timeout = 5000 ;\n").unwrap();
    assert_eq!(config.effective_client_receive_timeout_ms(), 5000);
    let config = with_lines("client_receive_timeout = 250 ;\n").unwrap();
    assert_eq!(config.effective_client_receive_timeout_ms(), 250);
}

#[test]
fn priority_level_form_parses() {
    let config = with_lines("server_priority = LEVEL$,00000042 ;\n").unwrap();
    assert_eq!(
        config.server_priority,
        ServerPriority::Level("00000042".to_string())
    );
}
