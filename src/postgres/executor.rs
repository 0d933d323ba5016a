use tokio_postgres::Client;

use super::params::Params;
use super::query::{build_result_set_from_rows, build_row, postgres_extract_value};
use crate::classify;
use crate::error::SqlContextError;
use crate::results::{CustomDbRow, ResultSet, RunResult};
use crate::types::RowValues;

/// Execute a statement and normalise its outcome into a [`RunResult`].
///
/// Statements without result columns report the server's affected-row count. With a
/// `RETURNING` clause the returned rows are the affected rows, and an insert's id is the
/// first column of the first row. Plain queries report no changes.
///
/// # Errors
/// Returns `SqlContextError` if preparing or executing the statement fails.
pub async fn run(
    client: &Client,
    query: &str,
    params: &[RowValues],
) -> Result<RunResult, SqlContextError> {
    let converted = Params::convert(params);
    let stmt = client.prepare(query).await?;
    if stmt.columns().is_empty() {
        let changes = client.execute(&stmt, converted.as_refs()).await?;
        return Ok(RunResult::with_changes(changes));
    }

    let rows = client.query(&stmt, converted.as_refs()).await?;
    if !classify::has_returning(query) {
        return Ok(RunResult::none());
    }
    let id = if classify::is_insert(query) {
        rows.first()
            .map(id_from_returning)
            .transpose()?
            .flatten()
    } else {
        None
    };
    Ok(RunResult {
        id,
        changes: rows.len() as u64,
    })
}

fn id_from_returning(row: &tokio_postgres::Row) -> Result<Option<i64>, SqlContextError> {
    if row.is_empty() {
        return Ok(None);
    }
    Ok(postgres_extract_value(row, 0)?.as_int().copied())
}

/// Execute a query and return its first row, if any.
///
/// # Errors
/// Returns `SqlContextError` if the query fails.
pub async fn get(
    client: &Client,
    query: &str,
    params: &[RowValues],
) -> Result<Option<CustomDbRow>, SqlContextError> {
    let converted = Params::convert(params);
    let rows = client.query(query, converted.as_refs()).await?;
    rows.first().map(build_row).transpose()
}

/// Execute a query and return every row.
///
/// # Errors
/// Returns `SqlContextError` if the query fails.
pub async fn all(
    client: &Client,
    query: &str,
    params: &[RowValues],
) -> Result<ResultSet, SqlContextError> {
    let converted = Params::convert(params);
    let rows = client.query(query, converted.as_refs()).await?;
    build_result_set_from_rows(&rows)
}

/// Execute a batch of statements through the simple query protocol.
///
/// # Errors
/// Returns `SqlContextError` if any statement in the batch fails.
pub async fn execute_batch(client: &Client, query: &str) -> Result<(), SqlContextError> {
    client.batch_execute(query).await?;
    Ok(())
}

pub(crate) async fn begin(client: &Client) -> Result<(), SqlContextError> {
    execute_batch(client, "BEGIN").await
}

pub(crate) async fn commit(client: &Client) -> Result<(), SqlContextError> {
    execute_batch(client, "COMMIT").await
}

pub(crate) async fn rollback(client: &Client) -> Result<(), SqlContextError> {
    execute_batch(client, "ROLLBACK").await
}
