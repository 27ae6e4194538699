// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    active = { ShutdownState::Active, 0 },
    gracefully = { ShutdownState::Gracefully, 1 },
    immediately = { ShutdownState::Immediately, 2 },
    terminated = { ShutdownState::Terminated, 3 },
)]
fn word_round_trip(state: ShutdownState, word: u8) {
    assert_eq!(state.as_u8(), word);
    assert_eq!(ShutdownState::from_u8(word), state);
}

#[test]
fn out_of_range_words_saturate_to_terminated() {
    assert_eq!(ShutdownState::from_u8(200), ShutdownState::Terminated);
}

#[test]
fn advance_is_monotonic() {
    let state = ShutdownState::Immediately;
    assert_eq!(
        state.advanced_to(ShutdownState::Gracefully),
        ShutdownState::Immediately
    );
    assert_eq!(
        state.advanced_to(ShutdownState::Terminated),
        ShutdownState::Terminated
    );
}

#[test]
fn only_active_reports_active() {
    assert!(ShutdownState::Active.is_active());
    assert!(!ShutdownState::Gracefully.is_active());
}
