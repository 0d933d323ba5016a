use std::sync::Arc;

use rusqlite::params_from_iter;

use super::config::SharedSqliteConnection;
use super::params::Params;
use super::query::{build_first_row, build_result_set};
use crate::classify;
use crate::error::SqlContextError;
use crate::results::{CustomDbRow, ResultSet, RunResult};
use crate::types::RowValues;

pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlContextError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlContextError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| SqlContextError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}

/// Execute a statement and normalise its outcome into a [`RunResult`].
///
/// Statements that produce rows (a `SELECT`, or DML with `RETURNING`) are stepped to
/// completion. `changes` is read from the connection only when the statement actually
/// modified rows, so DDL and queries report 0 whatever the last DML statement did.
///
/// # Errors
/// Returns `SqlContextError` if preparing or executing the statement fails.
pub async fn run(
    conn: &SharedSqliteConnection,
    query: &str,
    params: &[RowValues],
) -> Result<RunResult, SqlContextError> {
    let values = Params::convert(params)?.0;
    let sql_owned = query.to_owned();
    let is_insert = classify::is_insert(query);
    run_blocking(Arc::clone(conn), move |guard| {
        let total_before = guard.total_changes();
        let rowid_before = guard.last_insert_rowid();
        {
            let mut stmt = guard.prepare_cached(&sql_owned)?;
            if stmt.column_count() > 0 {
                let mut rows = stmt.query(params_from_iter(values.iter()))?;
                while rows.next()?.is_some() {}
            } else {
                stmt.execute(params_from_iter(values.iter()))?;
            }
        }
        // total_changes also counts trigger writes; changes() is the statement's own count
        let changes = if guard.total_changes() == total_before {
            0
        } else {
            guard.changes()
        };
        let rowid = guard.last_insert_rowid();
        let id = (changes > 0 && (is_insert || rowid != rowid_before)).then_some(rowid);
        Ok(RunResult { id, changes })
    })
    .await
}

/// Execute a query and return its first row, if any.
///
/// # Errors
/// Returns `SqlContextError` if preparing or executing the query fails.
pub async fn get(
    conn: &SharedSqliteConnection,
    query: &str,
    params: &[RowValues],
) -> Result<Option<CustomDbRow>, SqlContextError> {
    let values = Params::convert(params)?.0;
    let sql_owned = query.to_owned();
    run_blocking(Arc::clone(conn), move |guard| {
        let mut stmt = guard.prepare_cached(&sql_owned)?;
        build_first_row(&mut stmt, &values)
    })
    .await
}

/// Execute a query and return every row.
///
/// # Errors
/// Returns `SqlContextError` if preparing or executing the query fails.
pub async fn all(
    conn: &SharedSqliteConnection,
    query: &str,
    params: &[RowValues],
) -> Result<ResultSet, SqlContextError> {
    let values = Params::convert(params)?.0;
    let sql_owned = query.to_owned();
    run_blocking(Arc::clone(conn), move |guard| {
        let mut stmt = guard.prepare_cached(&sql_owned)?;
        build_result_set(&mut stmt, &values)
    })
    .await
}

/// Execute a batch of statements as-is.
///
/// # Errors
/// Returns `SqlContextError` if any statement in the batch fails.
pub async fn execute_batch(
    conn: &SharedSqliteConnection,
    query: &str,
) -> Result<(), SqlContextError> {
    let sql_owned = query.to_owned();
    run_blocking(Arc::clone(conn), move |guard| {
        guard.execute_batch(&sql_owned)?;
        Ok(())
    })
    .await
}

pub(crate) async fn begin(conn: &SharedSqliteConnection) -> Result<(), SqlContextError> {
    execute_batch(conn, "BEGIN").await
}

pub(crate) async fn commit(conn: &SharedSqliteConnection) -> Result<(), SqlContextError> {
    execute_batch(conn, "COMMIT").await
}

pub(crate) async fn rollback(conn: &SharedSqliteConnection) -> Result<(), SqlContextError> {
    execute_batch(conn, "ROLLBACK").await
}
