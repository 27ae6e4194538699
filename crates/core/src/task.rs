// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task codes: the closed set of operations a client may request.
//!
//! Every request packet carries one of these codes in its fixed header.
//! The numeric values are part of the protocol and never reused.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad dispatch class of a task, used for routing and for DISPLAY output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskClass {
    /// Credentials, thread begin/end, commit/rollback, keep-alive.
    ConnectionLifecycle,
    /// Statement execution, including batch and prepared re-execution.
    Statement,
    /// Cursor positioning and row retrieval.
    Cursor,
    /// Database dictionary queries.
    Metadata,
    /// Streamed large-object access.
    Blob,
    /// Multi-result-set iteration.
    ResultSet,
}

macro_rules! task_codes {
    ( $( $name:ident = $code:literal => ($class:ident, $label:literal) ),* $(,)? ) => {
        /// One client-requestable operation.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u16)]
        pub enum TaskCode {
            $( $name = $code, )*
        }

        impl TaskCode {
            /// Decode a header word. Unknown values are a protocol error
            /// handled by the dispatcher, not a panic.
            pub fn from_u16(code: u16) -> Option<Self> {
                match code {
                    $( $code => Some(Self::$name), )*
                    _ => None,
                }
            }

            pub fn as_u16(self) -> u16 {
                self as u16
            }

            pub fn class(self) -> TaskClass {
                match self {
                    $( Self::$name => TaskClass::$class, )*
                }
            }

            /// Stable lower-case label used in log lines and DISPLAY output.
            pub fn label(self) -> &'static str {
                match self {
                    $( Self::$name => $label, )*
                }
            }
        }
    };
}

task_codes! {
    // Connection lifecycle
    UseridPassword = 101 => (ConnectionLifecycle, "userid-password"),
    BeginThread = 102 => (ConnectionLifecycle, "begin-thread"),
    XaBeginThread = 103 => (ConnectionLifecycle, "xa-begin-thread"),
    EndThread = 104 => (ConnectionLifecycle, "end-thread"),
    CommitThread = 105 => (ConnectionLifecycle, "commit-thread"),
    RollbackThread = 106 => (ConnectionLifecycle, "rollback-thread"),
    SetAutocommit = 107 => (ConnectionLifecycle, "set-autocommit"),
    KeepAlive = 108 => (ConnectionLifecycle, "keep-alive"),

    // Statement execution
    ExecuteQuery = 201 => (Statement, "execute-query"),
    ExecuteUpdate = 202 => (Statement, "execute-update"),
    Execute = 203 => (Statement, "execute"),
    ExecutePrepared = 204 => (Statement, "execute-prepared"),
    ExecuteBatch = 205 => (Statement, "execute-batch"),
    CompleteStatement = 206 => (Statement, "complete-statement"),

    // Cursor & rows
    Next = 301 => (Cursor, "next"),
    NextN = 302 => (Cursor, "next-n"),
    PositionedFetch = 303 => (Cursor, "positioned-fetch"),
    DropCursor = 304 => (Cursor, "drop-cursor"),
    DropCursorAndMetadata = 305 => (Cursor, "drop-cursor-and-metadata"),

    // BLOB
    GetBlobData = 401 => (Blob, "get-blob-data"),
    SetBlobBytes = 402 => (Blob, "set-blob-bytes"),
    TruncateBlob = 403 => (Blob, "truncate-blob"),
    GetLobHandle = 404 => (Blob, "get-lob-handle"),

    // Metadata
    GetTables = 501 => (Metadata, "get-tables"),
    GetColumns = 502 => (Metadata, "get-columns"),
    GetPrimaryKeys = 503 => (Metadata, "get-primary-keys"),
    GetImportedKeys = 504 => (Metadata, "get-imported-keys"),
    GetExportedKeys = 505 => (Metadata, "get-exported-keys"),
    GetProcedures = 506 => (Metadata, "get-procedures"),
    GetProcedureColumns = 507 => (Metadata, "get-procedure-columns"),
    GetTypeInfo = 508 => (Metadata, "get-type-info"),
    GetTableTypes = 509 => (Metadata, "get-table-types"),
    GetVersionInfo = 510 => (Metadata, "get-version-info"),
    GetIndexInfo = 511 => (Metadata, "get-index-info"),
    GetBestRowIdentifier = 512 => (Metadata, "get-best-row-identifier"),
    GetCrossReference = 513 => (Metadata, "get-cross-reference"),
    GetCatalogs = 514 => (Metadata, "get-catalogs"),
    GetSchemas = 515 => (Metadata, "get-schemas"),
    ReleaseMetadataBuffers = 516 => (Metadata, "release-metadata-buffers"),

    // Result-set iteration
    NextResultUpdateCount = 601 => (ResultSet, "next-result-update-count"),
    NextResultCursor = 602 => (ResultSet, "next-result-cursor"),
    UpdaterRow = 603 => (ResultSet, "updater-row"),
}

impl TaskCode {
    /// Tasks allowed to start a connection's request stream, and the only
    /// tasks legal after an XA token mismatch.
    pub fn may_open_connection(self) -> bool {
        matches!(
            self,
            Self::UseridPassword | Self::BeginThread | Self::XaBeginThread
        )
    }
}

impl fmt::Display for TaskCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.as_u16())
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
