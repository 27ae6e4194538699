// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client trace-file name resolution.
//!
//! Four recognised request forms:
//!   1. `[file]N`: redirect marker, rewritten to `[default]N`.
//!   2. `[default]N`: default qualifier + product base + connection
//!      number (gateway mode) or generated run id (XA mode).
//!   3. `PRINT$`: the process stdout stream.
//!   4. a concrete name, given a default qualifier when it has none; in
//!      XA mode the filename portion is truncated to five characters and
//!      the generated run id appended so pooled connections never share a
//!      file.

use crate::logging::client_trace::PRINT_FILE;

const FILE_MARKER: &str = "[file]";
const DEFAULT_MARKER: &str = "[default]";
/// Base of default trace-file names in gateway mode.
const DEFAULT_BASE: &str = "trc-";
/// Base of default trace-file names in XA mode.
const DEFAULT_XA_BASE: &str = "trcx-";
/// XA filename portion cap before the run id suffix.
const XA_NAME_CHARS: usize = 5;

/// Resolve a requested trace-file name to the catalogued form.
///
/// `requested` of None (trace demanded without a name) resolves like
/// `[default]` with the connection number.
pub fn resolve_trace_name(
    requested: Option<&str>,
    qualifier: &str,
    generated_run_id: &str,
    xa_mode: bool,
    connection_number: u64,
) -> String {
    let requested = requested.unwrap_or(DEFAULT_MARKER).trim();

    // Form 1 becomes form 2 with the connection suffix retained.
    let requested = match requested.strip_prefix(FILE_MARKER) {
        Some(suffix) => format!("{DEFAULT_MARKER}{suffix}"),
        None => requested.to_string(),
    };

    // Form 2: expand the default marker.
    if let Some(suffix) = requested.strip_prefix(DEFAULT_MARKER) {
        if xa_mode {
            // The run id provides uniqueness; the connection number from
            // the marker is not used.
            return format!("{qualifier}*{DEFAULT_XA_BASE}{generated_run_id}");
        }
        let n = if suffix.is_empty() {
            connection_number.to_string()
        } else {
            suffix.to_string()
        };
        return format!("{qualifier}*{DEFAULT_BASE}{n}");
    }

    // Form 3: stdout attaches as-is.
    if requested == PRINT_FILE {
        return PRINT_FILE.to_string();
    }

    // Form 4: a concrete name.
    match requested.split_once('*') {
        Some((qual, name)) => {
            if xa_mode {
                let name: String = name.chars().take(XA_NAME_CHARS).collect();
                format!("{qual}*{name}-{generated_run_id}")
            } else {
                requested.clone()
            }
        }
        None => {
            if xa_mode {
                let name: String = requested.chars().take(XA_NAME_CHARS).collect();
                format!("{qualifier}*{name}-{generated_run_id}")
            } else {
                format!("{qualifier}*{requested}")
            }
        }
    }
}

#[cfg(test)]
#[path = "trace_file_tests.rs"]
mod tests;
