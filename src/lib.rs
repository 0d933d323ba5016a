//! Request-scoped transactional query execution over a bounded connection pool.
//!
//! Every request gets a [`RequestContext`]. Statements run through it: outside a
//! transaction each one borrows a pooled connection just long enough to execute, and after
//! `BEGIN` every statement of the request runs on the one connection leased for the
//! transaction until `COMMIT` or `ROLLBACK` releases it. When the request ends, however it
//! ends, anything left open is rolled back and the connection goes back to the pool.
//!
//! Route code does not pass the context around: [`Database::scope`] (or the axum
//! middleware in [`http`]) installs it for the request's task and the functions in
//! [`executor`] pick it up.
//!
//! ```rust,no_run
//! use sql_request_context::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlContextError> {
//! let db = Database::open(DatabaseConfig::sqlite("app.db")).await?;
//!
//! db.scope(async {
//!     executor::run("BEGIN", &[]).await?;
//!     executor::run("INSERT INTO audit (msg) VALUES (?1)", &[RowValues::Text("a".into())]).await?;
//!     // forgetting COMMIT is safe: the scope rolls the transaction back
//!     Ok::<_, SqlContextError>(())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("enable at least one backend feature: `sqlite` or `postgres`");

pub mod classify;
pub mod config;
pub mod context;
pub mod database;
pub mod error;
pub mod executor;
#[cfg(feature = "axum")]
pub mod http;
pub mod pool;
pub mod prelude;
pub mod results;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use classify::{StatementKind, classify};
pub use config::DatabaseConfig;
pub use context::{CleanupOutcome, RequestContext};
pub use database::Database;
pub use error::SqlContextError;
pub use pool::{ConnectionPool, PoolState, PooledConn};
pub use results::{CustomDbRow, ResultSet, RunResult};
pub use types::{DatabaseType, RowValues};
