// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn sql_value_display() {
    assert_eq!(SqlValue::Null.to_string(), "NULL");
    assert_eq!(SqlValue::Int(42).to_string(), "42");
    assert_eq!(SqlValue::Bytes(vec![1, 2, 3]).to_string(), "<3 bytes>");
}

#[test]
fn row_block_empty_is_end_of_data() {
    let block = RowBlock::empty();
    assert!(block.rows.is_empty());
    assert!(block.end_of_data);
}

#[test]
fn sql_value_serde_round_trip() {
    let values = vec![
        SqlValue::Null,
        SqlValue::Bool(true),
        SqlValue::Int(-7),
        SqlValue::Double(2.5),
        SqlValue::Text("abc".to_string()),
        SqlValue::Bytes(vec![0, 255]),
    ];
    let json = serde_json::to_string(&values).unwrap();
    let back: Vec<SqlValue> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, values);
}
