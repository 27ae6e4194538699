// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn execute_body_defaults_cover_omitted_fields() {
    // An older driver sends only the SQL text.
    let body: ExecuteBody = serde_json::from_str(r#"{"sql":"SELECT 1"}"#).unwrap();
    assert_eq!(body.sql, "SELECT 1");
    assert!(body.params.is_empty());
    assert!(body.section.is_none());
    assert!(!body.want_section);
    assert!(body.drop_cursor.is_none());
}

#[test]
fn begin_thread_body_defaults() {
    let body: BeginThreadBody = serde_json::from_str(
        r#"{"user_id":"U","password":"P","client_level":"2.1"}"#,
    )
    .unwrap();
    assert_eq!(body.access, AccessKind::Read);
    assert!(body.locale.is_none());
    assert!(body.keep_alive.is_none());
    assert!(!body.autocommit);
}

#[test]
fn metadata_args_all_optional() {
    let args: MetadataArgs = serde_json::from_str("{}").unwrap();
    assert_eq!(args, MetadataArgs::default());
}

#[test]
fn next_result_reply_round_trip() {
    let reply = NextResultReplyBody {
        update_count: Some(3),
        cursor: None,
        done: false,
    };
    let json = serde_json::to_string(&reply).unwrap();
    let back: NextResultReplyBody = serde_json::from_str(&json).unwrap();
    assert_eq!(back, reply);
}
