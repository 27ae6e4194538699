// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn unknown_locale_falls_back_to_english() {
    assert_eq!(
        localized("xx-YY", MsgId::InvalidCommand),
        localized("en", MsgId::InvalidCommand)
    );
}

#[test]
fn client_facing_texts_name_the_condition() {
    assert!(localized("en", MsgId::ServerBusy).contains("no server worker"));
    assert!(localized("en", MsgId::TraceFileCloseFailed).contains("close"));
    assert!(localized("en", MsgId::InvalidRequestId).contains("invalid id"));
}
