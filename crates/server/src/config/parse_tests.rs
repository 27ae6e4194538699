// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_assignments_comments_and_blanks() {
    let text = "\n// leading comment\nserver_name = GATE1 ;\n\nhost_port = 7544 ; // trailing\n";
    let parsed = parse(text).unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].key, "server_name");
    assert_eq!(parsed[0].value, "GATE1");
    assert_eq!(parsed[1].key, "host_port");
    assert_eq!(parsed[1].value, "7544");
    assert_eq!(parsed[1].line_no, 5);
}

#[test]
fn final_line_without_newline_is_parsed() {
    let parsed = parse("max_activities = 4 ;").unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].key, "max_activities");
}

#[test]
fn keys_are_lowercased_values_keep_case() {
    let parsed = parse("Client_Default_Tracefile_Qualifier = TrcQual ;").unwrap();
    assert_eq!(parsed[0].key, "client_default_tracefile_qualifier");
    assert_eq!(parsed[0].value, "TrcQual");
}

#[test]
fn missing_semicolon_is_a_syntax_error() {
    match parse("host_port = 7544") {
        Err(ConfigError::Syntax { line_no, .. }) => assert_eq!(line_no, 1),
        other => panic!("expected Syntax error, got {other:?}"),
    }
}

#[test]
fn missing_equals_is_a_syntax_error() {
    assert!(matches!(
        parse("host_port 7544 ;"),
        Err(ConfigError::Syntax { .. })
    ));
}

#[test]
fn comment_only_line_inside_assignment_region_is_ignored() {
    let parsed = parse("// just a note\n//another\n").unwrap();
    assert!(parsed.is_empty());
}
