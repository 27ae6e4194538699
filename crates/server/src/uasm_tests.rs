// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const LIST: &str = "# operators\nOPER1 secret\noper2 hunter2\nreadonly\n";

#[test]
fn off_mode_allows_anyone() {
    let table = AccessTable::empty(UserAccessControl::Off);
    assert_eq!(table.check("WHOEVER", "x"), AccessDecision::Allowed);
}

#[parameterized(
    good_password = { "OPER1", "secret", AccessDecision::Allowed },
    lowercase_user = { "oper2", "hunter2", AccessDecision::Allowed },
    wrong_password = { "OPER1", "nope", AccessDecision::Denied },
    unknown_user = { "GHOST", "x", AccessDecision::Denied },
)]
fn jdbc_mode_checks_passwords(user: &str, password: &str, decision: AccessDecision) {
    let table = AccessTable::from_text(UserAccessControl::Jdbc, LIST);
    assert_eq!(table.check(user, password), decision);
}

#[test]
fn fundamental_mode_checks_only_the_user() {
    let table = AccessTable::from_text(UserAccessControl::Fund, LIST);
    assert_eq!(table.check("READONLY", "anything"), AccessDecision::Allowed);
    assert_eq!(table.check("GHOST", "anything"), AccessDecision::Denied);
}

#[test]
fn comments_and_blanks_are_skipped() {
    let table = AccessTable::from_text(UserAccessControl::Jdbc, LIST);
    assert_eq!(table.len(), 3);
}

#[test]
fn missing_file_denies_when_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_table(
        UserAccessControl::Jdbc,
        &dir.path().join("does-not-exist.acl"),
    );
    assert!(table.is_empty());
    assert_eq!(table.check("OPER1", "secret"), AccessDecision::Denied);
}

#[test]
fn file_reload_reflects_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = access_file_path(dir.path());
    std::fs::write(&path, "U1 P1\n").unwrap();
    let table = load_table(UserAccessControl::Jdbc, &path);
    assert_eq!(table.check("U1", "P1"), AccessDecision::Allowed);

    std::fs::write(&path, "U2 P2\n").unwrap();
    let table = load_table(UserAccessControl::Jdbc, &path);
    assert_eq!(table.check("U1", "P1"), AccessDecision::Denied);
    assert_eq!(table.check("U2", "P2"), AccessDecision::Allowed);
}
