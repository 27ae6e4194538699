// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-plane vocabulary shared by the wire packets and the engine seam:
//! SQL values, row blocks, cursors and compiled sections.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One SQL value as it travels in a packet body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// One result row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row(pub Vec<SqlValue>);

/// Column shape of a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDesc {
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
}

impl ColumnDesc {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
        }
    }
}

/// A block of fetched rows. `end_of_data` tells the client whether another
/// fetch would return anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowBlock {
    pub columns: Vec<ColumnDesc>,
    pub rows: Vec<Row>,
    pub end_of_data: bool,
}

impl RowBlock {
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            end_of_data: true,
        }
    }
}

/// Identifier of an open cursor within one database thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorId(pub u32);

impl fmt::Display for CursorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cursor-{}", self.0)
    }
}

/// A compiled SQL plan handed back by the engine.
///
/// A client may embed the section in a later request to skip recompilation;
/// the engine validates `verify_id` and reports the section stale when the
/// schema has moved underneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlSection {
    pub statement_id: u64,
    pub verify_id: u64,
    pub image: Vec<u8>,
}

#[cfg(test)]
#[path = "sql_tests.rs"]
mod tests;
