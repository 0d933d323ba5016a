use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bb8::{ManageConnection, Pool};
use tokio::sync::Mutex;

use super::executor::run_blocking;
use crate::error::SqlContextError;

/// A pooled `SQLite` connection. Blocking work locks it from a `spawn_blocking` thread.
pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// bb8 manager for `SQLite` connections.
///
/// Every connection is opened against the same file with WAL journaling and the configured
/// busy timeout, so concurrent requests can read while one of them writes. An in-memory
/// path (`:memory:`) gives each pooled connection its own private database.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    path: String,
    busy_timeout: Duration,
}

impl SqliteManager {
    #[must_use]
    pub fn new(path: String, busy_timeout: Duration) -> Self {
        Self { path, busy_timeout }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Build a pool from this manager.
    ///
    /// One connection is opened and validated up front so a bad path fails here with the
    /// driver's error instead of surfacing later as a stalled lease. Later connection
    /// attempts are not retried.
    ///
    /// # Errors
    /// Returns `SqlContextError` if the probe connection or pool creation fails.
    pub async fn build_pool(
        self,
        max_size: u32,
        acquire_timeout: Duration,
    ) -> Result<Pool<SqliteManager>, SqlContextError> {
        let mut probe = self.connect().await?;
        self.is_valid(&mut probe).await?;
        drop(probe);

        Pool::builder()
            .max_size(max_size)
            .connection_timeout(acquire_timeout)
            .retry_connection(false)
            .build(self)
            .await
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = SqlContextError;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let path = self.path.clone();
        let busy_timeout = self.busy_timeout;
        async move {
            let conn = tokio::task::spawn_blocking(move || open_connection(&path, busy_timeout))
                .await
                .map_err(|e| {
                    SqlContextError::ConnectionError(format!("sqlite open join error: {e}"))
                })??;
            Ok(Arc::new(Mutex::new(conn)))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let handle = Arc::clone(conn);
        async move {
            run_blocking(handle, |guard| {
                guard.query_row("SELECT 1", [], |_| Ok(()))?;
                Ok(())
            })
            .await
        }
    }

    /// A connection still inside a transaction, or still referenced by blocking work that
    /// outlived its caller, must not be handed to another request.
    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        if Arc::strong_count(conn) > 1 {
            return true;
        }
        match conn.try_lock() {
            Ok(guard) => !guard.is_autocommit(),
            Err(_) => true,
        }
    }
}

fn open_connection(
    path: &str,
    busy_timeout: Duration,
) -> Result<rusqlite::Connection, SqlContextError> {
    let conn = rusqlite::Connection::open(path)?;
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    Ok(conn)
}
