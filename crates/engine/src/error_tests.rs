// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn section_invalid_covers_both_codes() {
    assert!(EngineError::new(EngineError::SECTION_STALE, "stale").is_section_invalid());
    assert!(EngineError::new(EngineError::SECTION_VERIFY_MISMATCH, "verify").is_section_invalid());
    assert!(!EngineError::new(EngineError::SYNTAX, "syntax").is_section_invalid());
}

#[test]
fn display_carries_code_and_message() {
    let err = EngineError::new(6025, "compiled section is stale");
    assert_eq!(err.to_string(), "engine status 6025: compiled section is stale");
}
