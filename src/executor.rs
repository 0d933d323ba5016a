//! Query functions that run against the task's current request context.
//!
//! These are the entry points route code uses: they look up the context installed by the
//! HTTP hook or [`crate::Database::scope`] and delegate to the matching
//! [`RequestContext`](crate::context::RequestContext) method.
//!
//! ```rust,no_run
//! use sql_request_context::prelude::*;
//!
//! async fn transfer(from: i64, to: i64, amount: i64) -> Result<(), SqlContextError> {
//!     executor::run("BEGIN", &[]).await?;
//!     executor::run(
//!         "UPDATE accounts SET balance = balance - ?1 WHERE id = ?2",
//!         &[RowValues::Int(amount), RowValues::Int(from)],
//!     )
//!     .await?;
//!     executor::run(
//!         "UPDATE accounts SET balance = balance + ?1 WHERE id = ?2",
//!         &[RowValues::Int(amount), RowValues::Int(to)],
//!     )
//!     .await?;
//!     executor::run("COMMIT", &[]).await?;
//!     Ok(())
//! }
//! ```

use crate::context;
use crate::error::SqlContextError;
use crate::results::{CustomDbRow, ResultSet, RunResult};
use crate::types::RowValues;

/// Execute a statement in the current request context.
///
/// # Errors
/// Returns `MissingContext` outside a request scope, otherwise see
/// [`RequestContext::run`](crate::context::RequestContext::run).
pub async fn run(query: &str, params: &[RowValues]) -> Result<RunResult, SqlContextError> {
    context::current()?.run(query, params).await
}

/// Fetch the first row of a query in the current request context.
///
/// # Errors
/// Returns `MissingContext` outside a request scope, or the backend error.
pub async fn get(
    query: &str,
    params: &[RowValues],
) -> Result<Option<CustomDbRow>, SqlContextError> {
    context::current()?.get(query, params).await
}

/// Fetch every row of a query in the current request context.
///
/// # Errors
/// Returns `MissingContext` outside a request scope, or the backend error.
pub async fn all(query: &str, params: &[RowValues]) -> Result<ResultSet, SqlContextError> {
    context::current()?.all(query, params).await
}

/// # Errors
/// Returns `MissingContext` outside a request scope, or the backend error.
pub async fn execute_batch(query: &str) -> Result<(), SqlContextError> {
    context::current()?.execute_batch(query).await
}

/// # Errors
/// Returns `MissingContext` outside a request scope, `ContextClosed` after cleanup, or the
/// pool/backend error.
pub async fn begin_transaction() -> Result<(), SqlContextError> {
    context::current()?.begin_transaction().await
}

/// # Errors
/// Returns `MissingContext` outside a request scope, or the backend error.
pub async fn commit() -> Result<(), SqlContextError> {
    context::current()?.commit().await
}

/// # Errors
/// Returns `MissingContext` outside a request scope, or the backend error.
pub async fn rollback() -> Result<(), SqlContextError> {
    context::current()?.rollback().await
}
