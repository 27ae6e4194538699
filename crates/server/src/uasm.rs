// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-Access Security Monitor.
//!
//! Periodically re-reads the access-control file and swaps the in-memory
//! table; workers consult the table when validating credentials at
//! connection start. File format: one `userid password` pair per line,
//! `#` comments. In the fundamental modes only the userid is checked.

use crate::config::UserAccessControl;
use crate::sgs::ServerGlobalState;
use rdgate_core::ShutdownState;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// File name of the access-control list under the state directory.
pub const ACCESS_FILE_NAME: &str = "user-access.acl";

/// Outcome of a credentials check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied,
}

/// The in-memory user table, swapped wholesale on each re-read.
#[derive(Debug, Default)]
pub struct AccessTable {
    mode: UserAccessControl,
    users: HashMap<String, String>,
}

impl AccessTable {
    pub fn from_text(mode: UserAccessControl, text: &str) -> Self {
        let mut users = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let Some(user) = fields.next() else {
                continue;
            };
            let password = fields.next().unwrap_or_default();
            users.insert(user.to_ascii_uppercase(), password.to_string());
        }
        Self { mode, users }
    }

    /// An empty table in the given mode: with access control enabled it
    /// denies everyone, which is the safe reading of a missing file.
    pub fn empty(mode: UserAccessControl) -> Self {
        Self {
            mode,
            users: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn check(&self, user_id: &str, password: &str) -> AccessDecision {
        match self.mode {
            UserAccessControl::Off => AccessDecision::Allowed,
            UserAccessControl::Fund | UserAccessControl::JdbcFundamental => {
                if self.users.contains_key(&user_id.to_ascii_uppercase()) {
                    AccessDecision::Allowed
                } else {
                    AccessDecision::Denied
                }
            }
            UserAccessControl::Jdbc | UserAccessControl::JdbcSecopt1 => {
                match self.users.get(&user_id.to_ascii_uppercase()) {
                    Some(expected) if expected == password => AccessDecision::Allowed,
                    _ => AccessDecision::Denied,
                }
            }
        }
    }
}

/// Path of the access file for a state directory.
pub fn access_file_path(state_dir: &Path) -> PathBuf {
    state_dir.join(ACCESS_FILE_NAME)
}

/// Load the table from disk, or an empty (denying) table when the file is
/// unreadable.
pub fn load_table(mode: UserAccessControl, path: &Path) -> AccessTable {
    match std::fs::read_to_string(path) {
        Ok(text) => AccessTable::from_text(mode, &text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AccessTable::empty(mode),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "access file read failed; denying all");
            AccessTable::empty(mode)
        }
    }
}

/// The UASM activity: re-read the access file until told to shut down.
pub async fn run(sgs: Arc<ServerGlobalState>) {
    let mode = sgs.config.user_access;
    let path = access_file_path(&sgs.state_dir);
    let interval = crate::env::uasm_interval();

    loop {
        if sgs.uasm_shutdown() != ShutdownState::Active {
            break;
        }
        if mode.enabled() {
            let table = load_table(mode, &path);
            debug!(users = table.len(), "user-access table refreshed");
            *sgs.access.lock() = table;
        }
        tokio::time::sleep(interval).await;
    }

    sgs.set_uasm_shutdown(ShutdownState::Terminated);
    debug!("user-access monitor terminated");
}

#[cfg(test)]
#[path = "uasm_tests.rs"]
mod tests;
