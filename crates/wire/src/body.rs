// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task-specific packet bodies.
//!
//! Bodies are JSON-encoded; the header carries their byte length. Fields
//! default where a client may legitimately omit them, so older drivers keep
//! working when a field is added.

use rdgate_core::sql::{CursorId, RowBlock, SqlSection, SqlValue};
use serde::{Deserialize, Serialize};

/// Credentials-check request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseridPasswordBody {
    pub user_id: String,
    pub password: String,
}

/// Database access requested at begin-thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessKind {
    #[default]
    Read,
    Update,
}

/// Begin-thread request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeginThreadBody {
    pub user_id: String,
    pub password: String,
    #[serde(default)]
    pub access: AccessKind,
    /// Client driver level, validated for compatibility.
    pub client_level: String,
    #[serde(default)]
    pub locale: Option<String>,
    /// Client's keep-alive wish; honoured only when policy allows override.
    #[serde(default)]
    pub keep_alive: Option<bool>,
    #[serde(default)]
    pub autocommit: bool,
}

/// Begin-thread reply body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeginThreadReplyBody {
    pub thread_name: String,
    pub server_level: String,
    pub engine_level: String,
    pub feature_flags: u32,
    pub keep_alive: bool,
    pub generated_run_id: String,
}

/// Statement execution request body (execute, execute-query,
/// execute-update, execute-prepared, execute-batch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteBody {
    pub sql: String,
    #[serde(default)]
    pub params: Vec<SqlValue>,
    /// Batched parameter rows for execute-batch.
    #[serde(default)]
    pub batch: Vec<Vec<SqlValue>>,
    /// Compiled section from an earlier reply, to skip recompilation.
    #[serde(default)]
    pub section: Option<SqlSection>,
    /// Ask the engine to return a (re)compiled section in the reply.
    #[serde(default)]
    pub want_section: bool,
    /// Cursor the client wants dropped before this statement runs.
    #[serde(default)]
    pub drop_cursor: Option<CursorId>,
}

/// Statement execution reply body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteReplyBody {
    #[serde(default)]
    pub update_count: Option<u64>,
    #[serde(default)]
    pub cursor: Option<CursorId>,
    #[serde(default)]
    pub section: Option<SqlSection>,
    /// First fetch block, piggybacked on queries to save a round trip.
    #[serde(default)]
    pub first_block: Option<RowBlock>,
    /// Per-statement update counts for execute-batch.
    #[serde(default)]
    pub batch_counts: Vec<u64>,
}

/// Row retrieval request body (next, next-N, positioned-fetch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchBody {
    pub cursor: CursorId,
    /// Row cap for this call; the fetch-block size still bounds the reply.
    #[serde(default)]
    pub max_rows: Option<u32>,
    /// Absolute row position for positioned-fetch.
    #[serde(default)]
    pub position: Option<u64>,
}

/// Row retrieval reply body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowsBody {
    pub block: RowBlock,
}

/// Arguments shared by the dictionary (metadata) task family. Each task
/// code reads the fields it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataArgs {
    #[serde(default)]
    pub catalog: Option<String>,
    #[serde(default)]
    pub schema_pattern: Option<String>,
    #[serde(default)]
    pub table_pattern: Option<String>,
    #[serde(default)]
    pub column_pattern: Option<String>,
    #[serde(default)]
    pub routine_pattern: Option<String>,
    #[serde(default)]
    pub table_types: Vec<String>,
    /// Second table of a cross-reference query.
    #[serde(default)]
    pub foreign_table: Option<String>,
    #[serde(default)]
    pub approximate: bool,
}

/// get-lob-handle request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobHandleBody {
    pub cursor: CursorId,
    pub column: u32,
}

/// get-lob-handle reply body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobHandleReplyBody {
    pub handle: u64,
    pub length: u64,
}

/// get-blob-data request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobDataBody {
    pub handle: u64,
    pub offset: u64,
    pub length: u32,
}

/// get-blob-data reply body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobDataReplyBody {
    pub data: Vec<u8>,
    pub end_of_lob: bool,
}

/// set-blob-bytes request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobWriteBody {
    pub handle: u64,
    pub offset: u64,
    pub data: Vec<u8>,
}

/// truncate-blob request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobTruncateBody {
    pub handle: u64,
    pub length: u64,
}

/// set-autocommit request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocommitBody {
    pub on: bool,
}

/// Reply body for the next-result-set family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextResultReplyBody {
    #[serde(default)]
    pub update_count: Option<u64>,
    #[serde(default)]
    pub cursor: Option<CursorId>,
    /// No further results remain.
    pub done: bool,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: i32,
    pub message: String,
}

#[cfg(test)]
#[path = "body_tests.rs"]
mod tests;
