use bb8::PooledConnection;

#[cfg(feature = "postgres")]
use crate::postgres::{self, PgManager};
#[cfg(feature = "sqlite")]
use crate::sqlite::{self, SqliteManager};

use crate::error::SqlContextError;
use crate::results::{CustomDbRow, ResultSet, RunResult};
use crate::types::RowValues;

/// A connection leased from a [`super::ConnectionPool`].
///
/// Dropping it returns the connection to the pool; the pool re-checks it before the next
/// lease and evicts it if it is broken.
pub enum PooledConn {
    #[cfg(feature = "sqlite")]
    Sqlite(PooledConnection<'static, SqliteManager>),
    #[cfg(feature = "postgres")]
    Postgres(PooledConnection<'static, PgManager>),
}

impl std::fmt::Debug for PooledConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => f.debug_tuple("Sqlite").field(&"<SqliteConnection>").finish(),
            #[cfg(feature = "postgres")]
            Self::Postgres(client) => f
                .debug_tuple("Postgres")
                .field(&client.is_closed())
                .finish(),
        }
    }
}

impl PooledConn {
    /// Execute a statement, returning its normalised [`RunResult`].
    ///
    /// # Errors
    /// Returns the backend error unchanged.
    pub async fn run(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<RunResult, SqlContextError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => sqlite::executor::run(conn, query, params).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(client) => postgres::executor::run(client, query, params).await,
        }
    }

    /// Execute a query and return its first row.
    ///
    /// # Errors
    /// Returns the backend error unchanged.
    pub async fn get(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<Option<CustomDbRow>, SqlContextError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => sqlite::executor::get(conn, query, params).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(client) => postgres::executor::get(client, query, params).await,
        }
    }

    /// Execute a query and return every row.
    ///
    /// # Errors
    /// Returns the backend error unchanged.
    pub async fn all(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlContextError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => sqlite::executor::all(conn, query, params).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(client) => postgres::executor::all(client, query, params).await,
        }
    }

    /// Execute a multi-statement script.
    ///
    /// # Errors
    /// Returns the backend error unchanged.
    pub async fn execute_batch(&self, query: &str) -> Result<(), SqlContextError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => sqlite::executor::execute_batch(conn, query).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(client) => postgres::executor::execute_batch(client, query).await,
        }
    }

    pub(crate) async fn begin(&self) -> Result<(), SqlContextError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => sqlite::executor::begin(conn).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(client) => postgres::executor::begin(client).await,
        }
    }

    pub(crate) async fn commit(&self) -> Result<(), SqlContextError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => sqlite::executor::commit(conn).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(client) => postgres::executor::commit(client).await,
        }
    }

    pub(crate) async fn rollback(&self) -> Result<(), SqlContextError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => sqlite::executor::rollback(conn).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(client) => postgres::executor::rollback(client).await,
        }
    }
}
