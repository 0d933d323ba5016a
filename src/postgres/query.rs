use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::Value;
use tokio_postgres::Row;

use crate::error::SqlContextError;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::RowValues;

/// Extracts a `RowValues` from a `tokio_postgres` row at the given index.
///
/// # Errors
/// Returns `SqlContextError` if the column cannot be retrieved.
pub fn postgres_extract_value(row: &Row, idx: usize) -> Result<RowValues, SqlContextError> {
    let type_info = row.columns()[idx].type_();

    match type_info.name() {
        "int2" => {
            let val: Option<i16> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))))
        }
        "int4" => {
            let val: Option<i32> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))))
        }
        "int8" => {
            let val: Option<i64> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Int))
        }
        "float4" => {
            let val: Option<f32> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, |v| RowValues::Float(f64::from(v))))
        }
        "float8" => {
            let val: Option<f64> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Float))
        }
        "bool" => {
            let val: Option<bool> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Bool))
        }
        "timestamp" => {
            let val: Option<NaiveDateTime> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Timestamp))
        }
        "json" | "jsonb" => {
            let val: Option<Value> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::JSON))
        }
        "bytea" => {
            let val: Option<Vec<u8>> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Blob))
        }
        // text, varchar, bpchar, name and anything else that decodes as a string
        _ => {
            let val: Option<String> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Text))
        }
    }
}

fn extract_row(row: &Row) -> Result<Vec<RowValues>, SqlContextError> {
    (0..row.columns().len())
        .map(|idx| postgres_extract_value(row, idx))
        .collect()
}

fn column_names(row: &Row) -> Arc<Vec<String>> {
    Arc::new(row.columns().iter().map(|c| c.name().to_string()).collect())
}

/// Build a result set from raw Postgres rows.
///
/// Column names come from the first row, so an empty result has none.
///
/// # Errors
/// Returns errors from row value extraction.
pub fn build_result_set_from_rows(rows: &[Row]) -> Result<ResultSet, SqlContextError> {
    let mut result_set = ResultSet::with_capacity(rows.len());
    if let Some(row) = rows.first() {
        result_set.set_column_names(column_names(row));
    }
    for row in rows {
        result_set.add_row_values(extract_row(row)?);
    }
    Ok(result_set)
}

/// Convert a single Postgres row into a [`CustomDbRow`].
///
/// # Errors
/// Returns errors from row value extraction.
pub fn build_row(row: &Row) -> Result<CustomDbRow, SqlContextError> {
    Ok(CustomDbRow::new(column_names(row), extract_row(row)?))
}
