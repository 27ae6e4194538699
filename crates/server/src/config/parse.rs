// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Syntactic pass over the configuration text.
//!
//! Grammar: `key = value ;` per line, `//` comments, blank lines ignored.
//! A trailing comment may follow the semicolon. The final line needs no
//! newline. Unknown keys are rejected by the validation pass, not here.

use super::ConfigError;

/// One `key = value` assignment with its source line for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub line_no: usize,
    pub key: String,
    pub value: String,
}

/// Split configuration text into assignments.
pub fn parse(text: &str) -> Result<Vec<Assignment>, ConfigError> {
    let mut assignments = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;

        // Strip a trailing comment, then surrounding whitespace.
        let line = match raw_line.find("//") {
            Some(at) => &raw_line[..at],
            None => raw_line,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let body = line
            .strip_suffix(';')
            .ok_or_else(|| ConfigError::Syntax {
                line_no,
                reason: "assignment must end with ';'".to_string(),
            })?;

        let (key, value) = body.split_once('=').ok_or_else(|| ConfigError::Syntax {
            line_no,
            reason: "expected 'key = value ;'".to_string(),
        })?;

        let key = key.trim().to_ascii_lowercase();
        let value = value.trim().to_string();
        if key.is_empty() {
            return Err(ConfigError::Syntax {
                line_no,
                reason: "missing keyword before '='".to_string(),
            });
        }

        assignments.push(Assignment {
            line_no,
            key,
            value,
        });
    }

    Ok(assignments)
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
