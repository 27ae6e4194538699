// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const Q: &str = "TRCQ";
const RUN: &str = "AB12CD";

#[parameterized(
    file_marker = { "[file]7", "TRCQ*trc-7" },
    default_marker = { "[default]7", "TRCQ*trc-7" },
    default_bare = { "[default]", "TRCQ*trc-42" },
    print_file = { "PRINT$", "PRINT$" },
    bare_name = { "mytrace", "TRCQ*mytrace" },
    qualified_name = { "OTHER*mytrace", "OTHER*mytrace" },
)]
fn gateway_mode_forms(requested: &str, resolved: &str) {
    assert_eq!(
        resolve_trace_name(Some(requested), Q, RUN, false, 42),
        resolved
    );
}

#[parameterized(
    file_marker = { "[file]7", "TRCQ*trcx-AB12CD" },
    default_marker = { "[default]31", "TRCQ*trcx-AB12CD" },
    bare_name = { "mylongtracename", "TRCQ*mylon-AB12CD" },
    qualified_name = { "OTHER*mylongtracename", "OTHER*mylon-AB12CD" },
    short_name = { "ab", "TRCQ*ab-AB12CD" },
)]
fn xa_mode_forms(requested: &str, resolved: &str) {
    assert_eq!(resolve_trace_name(Some(requested), Q, RUN, true, 42), resolved);
}

#[test]
fn missing_name_defaults_to_connection_number() {
    assert_eq!(resolve_trace_name(None, Q, RUN, false, 9), "TRCQ*trc-9");
}

#[test]
fn print_file_is_untouched_in_xa_mode_too() {
    assert_eq!(resolve_trace_name(Some("PRINT$"), Q, RUN, true, 1), "PRINT$");
}
