// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    always_off = { "always_off", KeepAlivePolicy::AlwaysOff },
    always_on = { "ALWAYS_ON", KeepAlivePolicy::AlwaysOn },
    off = { "off", KeepAlivePolicy::DefaultOff },
    on = { "On", KeepAlivePolicy::DefaultOn },
)]
fn parses_config_tokens(token: &str, policy: KeepAlivePolicy) {
    assert_eq!(token.parse::<KeepAlivePolicy>().unwrap(), policy);
}

#[test]
fn rejects_unknown_token() {
    assert!("sometimes".parse::<KeepAlivePolicy>().is_err());
}

#[parameterized(
    always_off = { KeepAlivePolicy::AlwaysOff, true, false },
    always_on = { KeepAlivePolicy::AlwaysOn, false, true },
    default_off = { KeepAlivePolicy::DefaultOff, true, true },
    default_on = { KeepAlivePolicy::DefaultOn, false, false },
)]
fn approve_respects_override_rules(policy: KeepAlivePolicy, requested: bool, approved: bool) {
    assert_eq!(policy.approve(requested), approved);
}

#[test]
fn initial_state_follows_on_variants() {
    assert!(KeepAlivePolicy::AlwaysOn.initial());
    assert!(KeepAlivePolicy::DefaultOn.initial());
    assert!(!KeepAlivePolicy::AlwaysOff.initial());
    assert!(!KeepAlivePolicy::DefaultOff.initial());
}
