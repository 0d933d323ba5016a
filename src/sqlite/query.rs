use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{Statement, params_from_iter};

use crate::error::SqlContextError;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
/// Returns `SqlContextError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, SqlContextError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

fn column_names(stmt: &Statement) -> Arc<Vec<String>> {
    Arc::new(
        stmt.column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect(),
    )
}

fn extract_row(row: &rusqlite::Row, col_count: usize) -> Result<Vec<RowValues>, SqlContextError> {
    (0..col_count)
        .map(|idx| sqlite_extract_value_sync(row, idx))
        .collect()
}

/// Run a query and materialise every row, in order.
///
/// # Errors
/// Returns `SqlContextError` if query execution or value extraction fails.
pub fn build_result_set(
    stmt: &mut Statement,
    params: &[Value],
) -> Result<ResultSet, SqlContextError> {
    let names = column_names(stmt);
    let col_count = names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(names);

    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    while let Some(row) = rows.next()? {
        result_set.add_row_values(extract_row(row, col_count)?);
    }
    Ok(result_set)
}

/// Run a query and keep only the first row; the rest are never stepped.
///
/// # Errors
/// Returns `SqlContextError` if query execution or value extraction fails.
pub fn build_first_row(
    stmt: &mut Statement,
    params: &[Value],
) -> Result<Option<CustomDbRow>, SqlContextError> {
    let names = column_names(stmt);
    let col_count = names.len();

    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    match rows.next()? {
        Some(row) => Ok(Some(CustomDbRow::new(names, extract_row(row, col_count)?))),
        None => Ok(None),
    }
}
