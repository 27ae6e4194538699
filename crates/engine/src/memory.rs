// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory engine used by the gateway's test suites.
//!
//! Supports a deliberately small SQL surface (literal SELECT, `SELECT *
//! FROM`, INSERT/UPDATE/DELETE, ALTER to force schema movement) plus the
//! full section, cursor, LOB and multi-result plumbing the dispatcher
//! exercises. Tests script failures through `fail_next_execute` and
//! `invalidate_sections`.

use crate::error::EngineError;
use crate::seam::{
    DictionaryArgs, DictionaryQuery, ExecuteOutcome, NextResult, RelationalEngine,
    StatementOptions, ThreadId, ThreadOptions,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use rdgate_core::sql::{ColumnDesc, CursorId, Row, RowBlock, SqlSection, SqlValue};
use std::collections::{HashMap, VecDeque};

/// One registered table.
#[derive(Debug, Clone)]
struct Table {
    columns: Vec<ColumnDesc>,
    rows: Vec<Row>,
}

#[derive(Debug, Default)]
struct CursorState {
    columns: Vec<ColumnDesc>,
    rows: VecDeque<Row>,
}

#[derive(Debug, Default)]
struct ThreadState {
    autocommit: bool,
    cursors: HashMap<CursorId, CursorState>,
    lobs: HashMap<u64, Vec<u8>>,
    pending_results: VecDeque<NextResult>,
}

#[derive(Default)]
struct EngineState {
    tables: HashMap<String, Table>,
    threads: HashMap<u64, ThreadState>,
    next_thread: u64,
    next_cursor: u32,
    next_lob: u64,
    next_statement: u64,
    /// Bumped by ALTER (and by the test hook); sections carry the value
    /// they were compiled against.
    schema_generation: u64,
    fail_next_execute: Option<EngineError>,
    rollbacks: u64,
    /// Every drop_cursor actually performed, in order.
    drops_performed: Vec<CursorId>,
    /// (sql, used_request_section) per execute call.
    execute_log: Vec<(String, bool)>,
}

/// In-memory [`RelationalEngine`].
#[derive(Default)]
pub struct MemoryEngine {
    state: Mutex<EngineState>,
    sections_supported: bool,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
            sections_supported: true,
        }
    }

    /// An engine level without compiled-section support, for the
    /// text-only dispatch path.
    pub fn without_sections() -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
            sections_supported: false,
        }
    }

    /// Register a table for `SELECT * FROM`.
    pub fn with_table(
        self,
        name: &str,
        columns: &[&str],
        rows: Vec<Vec<SqlValue>>,
    ) -> Self {
        {
            let mut state = self.state.lock();
            state.tables.insert(
                name.to_ascii_uppercase(),
                Table {
                    columns: columns
                        .iter()
                        .map(|c| ColumnDesc::new(*c, "VARCHAR"))
                        .collect(),
                    rows: rows.into_iter().map(Row).collect(),
                },
            );
        }
        self
    }

    /// Script the next execute call to fail with the given status.
    pub fn fail_next_execute(&self, code: i32, message: &str) {
        self.state.lock().fail_next_execute = Some(EngineError::new(code, message));
    }

    /// Invalidate every outstanding compiled section, as an ALTER would.
    pub fn invalidate_sections(&self) {
        self.state.lock().schema_generation += 1;
    }

    pub fn open_thread_count(&self) -> usize {
        self.state.lock().threads.len()
    }

    pub fn rollback_count(&self) -> u64 {
        self.state.lock().rollbacks
    }

    pub fn drops_performed(&self) -> Vec<CursorId> {
        self.state.lock().drops_performed.clone()
    }

    pub fn execute_log(&self) -> Vec<(String, bool)> {
        self.state.lock().execute_log.clone()
    }
}

/// What one statement produced before it is shaped into an outcome.
enum StatementResult {
    Rows {
        columns: Vec<ColumnDesc>,
        rows: Vec<Row>,
    },
    Count(u64),
}

impl EngineState {
    fn thread_mut(&mut self, thread: ThreadId) -> Result<&mut ThreadState, EngineError> {
        self.threads
            .get_mut(&thread.0)
            .ok_or_else(EngineError::no_such_thread)
    }

    fn run_statement(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<StatementResult, EngineError> {
        let text = sql.trim();
        let upper = text.to_ascii_uppercase();

        if let Some(rest) = upper.strip_prefix("SELECT ") {
            let rest = rest.trim();
            if let Some(table_name) = rest.strip_prefix("* FROM ") {
                let key = table_name.trim().trim_end_matches(';').to_string();
                let table = self
                    .tables
                    .get(&key)
                    .ok_or_else(|| EngineError::new(EngineError::SYNTAX, "no such table"))?;
                return Ok(StatementResult::Rows {
                    columns: table.columns.clone(),
                    rows: table.rows.clone(),
                });
            }
            if let Ok(literal) = rest.trim_end_matches(';').trim().parse::<i64>() {
                return Ok(StatementResult::Rows {
                    columns: vec![ColumnDesc::new("C1", "INTEGER")],
                    rows: vec![Row(vec![SqlValue::Int(literal)])],
                });
            }
            return Err(EngineError::new(
                EngineError::SYNTAX,
                "unsupported SELECT form",
            ));
        }

        if let Some(rest) = upper.strip_prefix("INSERT INTO ") {
            let key = rest
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            let table = self
                .tables
                .entry(key)
                .or_insert_with(|| Table {
                    columns: vec![ColumnDesc::new("C1", "VARCHAR")],
                    rows: Vec::new(),
                });
            table.rows.push(Row(params.to_vec()));
            return Ok(StatementResult::Count(1));
        }

        if upper.starts_with("UPDATE ") {
            return Ok(StatementResult::Count(1));
        }

        if let Some(rest) = upper.strip_prefix("DELETE FROM ") {
            let key = rest.trim().trim_end_matches(';').to_string();
            let removed = match self.tables.get_mut(&key) {
                Some(table) => {
                    let n = table.rows.len() as u64;
                    table.rows.clear();
                    n
                }
                None => 0,
            };
            return Ok(StatementResult::Count(removed));
        }

        if upper.starts_with("ALTER ") {
            self.schema_generation += 1;
            return Ok(StatementResult::Count(0));
        }

        Err(EngineError::new(
            EngineError::SYNTAX,
            format!("cannot run statement: {}", text.chars().take(40).collect::<String>()),
        ))
    }

    fn open_cursor(
        &mut self,
        thread: ThreadId,
        columns: Vec<ColumnDesc>,
        rows: Vec<Row>,
    ) -> Result<CursorId, EngineError> {
        self.next_cursor += 1;
        let cursor = CursorId(self.next_cursor);
        let state = self.thread_mut(thread)?;
        state.cursors.insert(
            cursor,
            CursorState {
                columns,
                rows: rows.into(),
            },
        );
        Ok(cursor)
    }

    fn fetch_block(
        &mut self,
        thread: ThreadId,
        cursor: CursorId,
        max_rows: u32,
    ) -> Result<RowBlock, EngineError> {
        let state = self.thread_mut(thread)?;
        let cursor_state = state
            .cursors
            .get_mut(&cursor)
            .ok_or_else(EngineError::no_such_cursor)?;
        let take = (max_rows as usize).min(cursor_state.rows.len());
        let rows: Vec<Row> = cursor_state.rows.drain(..take).collect();
        Ok(RowBlock {
            columns: cursor_state.columns.clone(),
            end_of_data: cursor_state.rows.is_empty(),
            rows,
        })
    }
}

#[async_trait]
impl RelationalEngine for MemoryEngine {
    fn level(&self) -> String {
        "MEMORY 1R1".to_string()
    }

    fn supports_sql_sections(&self) -> bool {
        self.sections_supported
    }

    async fn begin_thread(&self, opts: ThreadOptions) -> Result<ThreadId, EngineError> {
        let mut state = self.state.lock();
        state.next_thread += 1;
        let id = state.next_thread;
        state.threads.insert(
            id,
            ThreadState {
                autocommit: opts.autocommit,
                ..ThreadState::default()
            },
        );
        Ok(ThreadId(id))
    }

    async fn end_thread(&self, thread: ThreadId) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state
            .threads
            .remove(&thread.0)
            .map(|_| ())
            .ok_or_else(EngineError::no_such_thread)
    }

    async fn commit(&self, thread: ThreadId) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        let thread_state = state.thread_mut(thread)?;
        // LOB handles live only within the transaction that obtained them.
        thread_state.lobs.clear();
        Ok(())
    }

    async fn rollback(&self, thread: ThreadId) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        let thread_state = state.thread_mut(thread)?;
        thread_state.lobs.clear();
        state.rollbacks += 1;
        Ok(())
    }

    async fn set_autocommit(&self, thread: ThreadId, on: bool) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.thread_mut(thread)?.autocommit = on;
        Ok(())
    }

    async fn execute(
        &self,
        thread: ThreadId,
        sql: &str,
        params: &[SqlValue],
        section: Option<&SqlSection>,
        opts: StatementOptions,
        fetch_block_rows: u32,
    ) -> Result<ExecuteOutcome, EngineError> {
        let mut state = self.state.lock();
        state
            .execute_log
            .push((sql.to_string(), opts.use_request_section && section.is_some()));

        if let Some(err) = state.fail_next_execute.take() {
            return Err(err);
        }
        state.thread_mut(thread)?;

        // A stale embedded section fails before any statement runs.
        if opts.use_request_section {
            if let Some(section) = section {
                if section.verify_id != state.schema_generation {
                    return Err(EngineError::new(
                        EngineError::SECTION_VERIFY_MISMATCH,
                        "compiled section verify id does not match",
                    ));
                }
            }
        }

        let mut statements = sql
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<VecDeque<&str>>();
        let first = statements
            .pop_front()
            .ok_or_else(|| EngineError::new(EngineError::SYNTAX, "empty statement"))?;

        let result = self.run_locked(&mut state, thread, first, params, opts, fetch_block_rows)?;

        // Remaining statements queue up for the next-result family.
        let mut queued = Vec::new();
        for text in statements {
            let next = match state.run_statement(text, params)? {
                StatementResult::Rows { columns, rows } => {
                    let cursor = state.open_cursor(thread, columns, rows)?;
                    NextResult {
                        update_count: None,
                        cursor: Some(cursor),
                        done: false,
                    }
                }
                StatementResult::Count(n) => NextResult {
                    update_count: Some(n),
                    cursor: None,
                    done: false,
                },
            };
            queued.push(next);
        }
        state.thread_mut(thread)?.pending_results.extend(queued);

        Ok(result)
    }

    async fn execute_batch(
        &self,
        thread: ThreadId,
        sql: &str,
        batch: &[Vec<SqlValue>],
    ) -> Result<Vec<u64>, EngineError> {
        let mut state = self.state.lock();
        state.thread_mut(thread)?;
        let mut counts = Vec::with_capacity(batch.len());
        for params in batch {
            match state.run_statement(sql, params)? {
                StatementResult::Count(n) => counts.push(n),
                StatementResult::Rows { .. } => {
                    return Err(EngineError::new(
                        EngineError::SYNTAX,
                        "batch statements must not return rows",
                    ))
                }
            }
        }
        Ok(counts)
    }

    async fn fetch(
        &self,
        thread: ThreadId,
        cursor: CursorId,
        max_rows: u32,
    ) -> Result<RowBlock, EngineError> {
        self.state.lock().fetch_block(thread, cursor, max_rows)
    }

    async fn positioned_fetch(
        &self,
        thread: ThreadId,
        cursor: CursorId,
        position: u64,
        max_rows: u32,
    ) -> Result<RowBlock, EngineError> {
        let mut state = self.state.lock();
        let thread_state = state.thread_mut(thread)?;
        let cursor_state = thread_state
            .cursors
            .get_mut(&cursor)
            .ok_or_else(EngineError::no_such_cursor)?;
        let skip = (position as usize).min(cursor_state.rows.len());
        cursor_state.rows.drain(..skip);
        state.fetch_block(thread, cursor, max_rows)
    }

    async fn drop_cursor(&self, thread: ThreadId, cursor: CursorId) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        let thread_state = state.thread_mut(thread)?;
        thread_state
            .cursors
            .remove(&cursor)
            .ok_or_else(EngineError::no_such_cursor)?;
        state.drops_performed.push(cursor);
        Ok(())
    }

    async fn dictionary(
        &self,
        thread: ThreadId,
        query: DictionaryQuery,
        args: DictionaryArgs,
    ) -> Result<RowBlock, EngineError> {
        let mut state = self.state.lock();
        state.thread_mut(thread)?;
        let block = match query {
            DictionaryQuery::Tables => {
                let pattern = args.table_pattern.unwrap_or_else(|| "%".to_string());
                let mut names: Vec<&String> = state
                    .tables
                    .keys()
                    .filter(|name| pattern == "%" || **name == pattern.to_ascii_uppercase())
                    .collect();
                names.sort();
                RowBlock {
                    columns: vec![
                        ColumnDesc::new("TABLE_NAME", "VARCHAR"),
                        ColumnDesc::new("TABLE_TYPE", "VARCHAR"),
                    ],
                    rows: names
                        .into_iter()
                        .map(|name| {
                            Row(vec![
                                SqlValue::Text(name.clone()),
                                SqlValue::Text("TABLE".to_string()),
                            ])
                        })
                        .collect(),
                    end_of_data: true,
                }
            }
            DictionaryQuery::Columns => {
                let table = args
                    .table_pattern
                    .unwrap_or_default()
                    .to_ascii_uppercase();
                let mut rows = Vec::new();
                if let Some(t) = state.tables.get(&table) {
                    for (i, column) in t.columns.iter().enumerate() {
                        rows.push(Row(vec![
                            SqlValue::Text(table.clone()),
                            SqlValue::Text(column.name.clone()),
                            SqlValue::Int(i as i64 + 1),
                        ]));
                    }
                }
                RowBlock {
                    columns: vec![
                        ColumnDesc::new("TABLE_NAME", "VARCHAR"),
                        ColumnDesc::new("COLUMN_NAME", "VARCHAR"),
                        ColumnDesc::new("ORDINAL_POSITION", "INTEGER"),
                    ],
                    rows,
                    end_of_data: true,
                }
            }
            DictionaryQuery::VersionInfo => RowBlock {
                columns: vec![ColumnDesc::new("ENGINE_LEVEL", "VARCHAR")],
                rows: vec![Row(vec![SqlValue::Text(self.level())])],
                end_of_data: true,
            },
            // The remaining dictionary surfaces answer with an empty,
            // well-formed result.
            _ => RowBlock::empty(),
        };
        Ok(block)
    }

    async fn lob_handle(
        &self,
        thread: ThreadId,
        cursor: CursorId,
        column: u32,
    ) -> Result<(u64, u64), EngineError> {
        let mut state = self.state.lock();
        let thread_state = state.thread_mut(thread)?;
        let cursor_state = thread_state
            .cursors
            .get(&cursor)
            .ok_or_else(EngineError::no_such_cursor)?;
        let row = cursor_state
            .rows
            .front()
            .ok_or_else(|| EngineError::new(EngineError::NO_SUCH_LOB, "cursor has no current row"))?;
        let value = row
            .0
            .get(column as usize)
            .ok_or_else(EngineError::no_such_lob)?;
        let data = match value {
            SqlValue::Bytes(bytes) => bytes.clone(),
            SqlValue::Text(text) => text.clone().into_bytes(),
            _ => return Err(EngineError::no_such_lob()),
        };
        let len = data.len() as u64;
        state.next_lob += 1;
        let handle = state.next_lob;
        state.thread_mut(thread)?.lobs.insert(handle, data);
        Ok((handle, len))
    }

    async fn blob_read(
        &self,
        thread: ThreadId,
        handle: u64,
        offset: u64,
        length: u32,
    ) -> Result<(Vec<u8>, bool), EngineError> {
        let mut state = self.state.lock();
        let thread_state = state.thread_mut(thread)?;
        let data = thread_state
            .lobs
            .get(&handle)
            .ok_or_else(EngineError::no_such_lob)?;
        let start = (offset as usize).min(data.len());
        let end = start.saturating_add(length as usize).min(data.len());
        Ok((data[start..end].to_vec(), end == data.len()))
    }

    async fn blob_write(
        &self,
        thread: ThreadId,
        handle: u64,
        offset: u64,
        data: &[u8],
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        let thread_state = state.thread_mut(thread)?;
        let lob = thread_state
            .lobs
            .get_mut(&handle)
            .ok_or_else(EngineError::no_such_lob)?;
        let end = (offset as usize).saturating_add(data.len());
        if lob.len() < end {
            lob.resize(end, 0);
        }
        lob[offset as usize..end].copy_from_slice(data);
        Ok(())
    }

    async fn blob_truncate(
        &self,
        thread: ThreadId,
        handle: u64,
        length: u64,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        let thread_state = state.thread_mut(thread)?;
        let lob = thread_state
            .lobs
            .get_mut(&handle)
            .ok_or_else(EngineError::no_such_lob)?;
        lob.truncate(length as usize);
        Ok(())
    }

    async fn next_result(&self, thread: ThreadId) -> Result<NextResult, EngineError> {
        let mut state = self.state.lock();
        let thread_state = state.thread_mut(thread)?;
        Ok(thread_state
            .pending_results
            .pop_front()
            .unwrap_or(NextResult {
                update_count: None,
                cursor: None,
                done: true,
            }))
    }
}

impl MemoryEngine {
    /// Shape one statement's result into an outcome, minting a section when
    /// asked and the engine level supports them.
    fn run_locked(
        &self,
        state: &mut EngineState,
        thread: ThreadId,
        sql: &str,
        params: &[SqlValue],
        opts: StatementOptions,
        fetch_block_rows: u32,
    ) -> Result<ExecuteOutcome, EngineError> {
        let result = state.run_statement(sql, params)?;
        let section = if opts.want_section && self.sections_supported {
            state.next_statement += 1;
            Some(SqlSection {
                statement_id: state.next_statement,
                verify_id: state.schema_generation,
                image: sql.as_bytes().to_vec(),
            })
        } else {
            None
        };

        match result {
            StatementResult::Rows { columns, rows } => {
                let cursor = state.open_cursor(thread, columns, rows)?;
                let first_block = state.fetch_block(thread, cursor, fetch_block_rows)?;
                Ok(ExecuteOutcome {
                    update_count: None,
                    cursor: Some(cursor),
                    section,
                    first_block: Some(first_block),
                })
            }
            StatementResult::Count(n) => Ok(ExecuteOutcome {
                update_count: Some(n),
                cursor: None,
                section,
                first_block: None,
            }),
        }
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
