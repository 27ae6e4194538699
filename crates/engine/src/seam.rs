// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `RelationalEngine` trait and its argument types.

use crate::EngineError;
use async_trait::async_trait;
use rdgate_core::sql::{CursorId, RowBlock, SqlSection, SqlValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one open database thread (one client connection's
/// transaction context inside the engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub u64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread-{}", self.0)
    }
}

/// Options for opening a database thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadOptions {
    pub thread_name: String,
    pub user_id: String,
    pub update_access: bool,
    pub autocommit: bool,
}

/// How the dispatcher wants a statement executed. The three flags encode
/// the compiled-section retry contract: the first attempt uses the
/// request's section and asks for a fresh one back; the retry runs from
/// text only and must not repeat cursor-drop side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementOptions {
    /// Use the section embedded in the request, if any.
    pub use_request_section: bool,
    /// Return a (re)compiled section with the outcome.
    pub want_section: bool,
    /// Perform the cursor drop named in the request.
    pub perform_cursor_drop: bool,
}

impl StatementOptions {
    /// First attempt: sections on, cursor drop on.
    pub fn first_attempt() -> Self {
        Self {
            use_request_section: true,
            want_section: true,
            perform_cursor_drop: true,
        }
    }

    /// Retry after a section-invalid status: text only, no repeated drop.
    pub fn text_only_retry() -> Self {
        Self {
            use_request_section: false,
            want_section: true,
            perform_cursor_drop: false,
        }
    }

    /// Engines without section support always run from text.
    pub fn no_sections() -> Self {
        Self {
            use_request_section: false,
            want_section: false,
            perform_cursor_drop: true,
        }
    }
}

/// Result of one statement execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteOutcome {
    pub update_count: Option<u64>,
    pub cursor: Option<CursorId>,
    pub section: Option<SqlSection>,
    /// First fetch block for queries, bounded by the fetch-block size.
    pub first_block: Option<RowBlock>,
}

/// One step of multi-result-set iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NextResult {
    pub update_count: Option<u64>,
    pub cursor: Option<CursorId>,
    pub done: bool,
}

/// The dictionary query family (JDBC DatabaseMetaData surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryQuery {
    Tables,
    Columns,
    PrimaryKeys,
    ImportedKeys,
    ExportedKeys,
    Procedures,
    ProcedureColumns,
    TypeInfo,
    TableTypes,
    VersionInfo,
    IndexInfo,
    BestRowIdentifier,
    CrossReference,
    Catalogs,
    Schemas,
}

/// Pattern arguments for dictionary queries. Each query kind reads the
/// fields that apply to it and ignores the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryArgs {
    pub catalog: Option<String>,
    pub schema_pattern: Option<String>,
    pub table_pattern: Option<String>,
    pub column_pattern: Option<String>,
    pub routine_pattern: Option<String>,
    pub table_types: Vec<String>,
    pub foreign_table: Option<String>,
    pub approximate: bool,
}

/// The narrow command/cursor interface the gateway drives.
///
/// All methods are cancel-safe from the gateway's point of view: a worker
/// abandoning a call mid-await (immediate shutdown) must leave the engine
/// free to roll the thread back afterwards.
#[async_trait]
pub trait RelationalEngine: Send + Sync {
    /// Engine level string for begin-thread replies and DISPLAY output.
    fn level(&self) -> String;

    /// Whether compiled SQL sections are supported at this engine level.
    fn supports_sql_sections(&self) -> bool;

    async fn begin_thread(&self, opts: ThreadOptions) -> Result<ThreadId, EngineError>;

    async fn end_thread(&self, thread: ThreadId) -> Result<(), EngineError>;

    async fn commit(&self, thread: ThreadId) -> Result<(), EngineError>;

    async fn rollback(&self, thread: ThreadId) -> Result<(), EngineError>;

    async fn set_autocommit(&self, thread: ThreadId, on: bool) -> Result<(), EngineError>;

    async fn execute(
        &self,
        thread: ThreadId,
        sql: &str,
        params: &[SqlValue],
        section: Option<&SqlSection>,
        opts: StatementOptions,
        fetch_block_rows: u32,
    ) -> Result<ExecuteOutcome, EngineError>;

    async fn execute_batch(
        &self,
        thread: ThreadId,
        sql: &str,
        batch: &[Vec<SqlValue>],
    ) -> Result<Vec<u64>, EngineError>;

    async fn fetch(
        &self,
        thread: ThreadId,
        cursor: CursorId,
        max_rows: u32,
    ) -> Result<RowBlock, EngineError>;

    async fn positioned_fetch(
        &self,
        thread: ThreadId,
        cursor: CursorId,
        position: u64,
        max_rows: u32,
    ) -> Result<RowBlock, EngineError>;

    async fn drop_cursor(&self, thread: ThreadId, cursor: CursorId) -> Result<(), EngineError>;

    async fn dictionary(
        &self,
        thread: ThreadId,
        query: DictionaryQuery,
        args: DictionaryArgs,
    ) -> Result<RowBlock, EngineError>;

    /// Returns (handle, total length in bytes).
    async fn lob_handle(
        &self,
        thread: ThreadId,
        cursor: CursorId,
        column: u32,
    ) -> Result<(u64, u64), EngineError>;

    /// Returns (data, end-of-lob flag).
    async fn blob_read(
        &self,
        thread: ThreadId,
        handle: u64,
        offset: u64,
        length: u32,
    ) -> Result<(Vec<u8>, bool), EngineError>;

    async fn blob_write(
        &self,
        thread: ThreadId,
        handle: u64,
        offset: u64,
        data: &[u8],
    ) -> Result<(), EngineError>;

    async fn blob_truncate(
        &self,
        thread: ThreadId,
        handle: u64,
        length: u64,
    ) -> Result<(), EngineError>;

    async fn next_result(&self, thread: ThreadId) -> Result<NextResult, EngineError>;
}
