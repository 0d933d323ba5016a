pub mod connection;
pub mod types;

pub use connection::PooledConn;
pub use types::{BackendPool, PoolState};

use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::SqlContextError;
use crate::types::DatabaseType;

/// Bounded pool of database connections shared by every request.
///
/// Leases beyond `max_size` wait in the pool's queue until a connection is returned.
/// Cloning shares the same underlying pool.
#[derive(Clone, Debug)]
pub struct ConnectionPool {
    backend: BackendPool,
    max_size: u32,
}

impl ConnectionPool {
    /// Build the backend pool described by `config`.
    ///
    /// One connection is opened and validated up front so an unreachable database fails
    /// here with the driver's error; it is not kept, and the first lease opens its own.
    ///
    /// # Errors
    /// Returns `SqlContextError::ConfigError` if the backend is not compiled in or the
    /// connection string is invalid.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, SqlContextError> {
        let max_size = config.max_connections;
        let acquire_timeout = config.acquire_timeout();
        let backend = match config.db_type {
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => {
                let manager =
                    crate::sqlite::SqliteManager::new(config.url.clone(), config.busy_timeout());
                BackendPool::Sqlite(manager.build_pool(max_size, acquire_timeout).await?)
            }
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => {
                let manager = crate::postgres::PgManager::from_url(&config.url)?;
                BackendPool::Postgres(manager.build_pool(max_size, acquire_timeout).await?)
            }
            #[allow(unreachable_patterns)]
            other => {
                return Err(SqlContextError::ConfigError(format!(
                    "{other:?} support is not enabled in this build"
                )));
            }
        };
        Ok(Self { backend, max_size })
    }

    /// Lease a connection, waiting while the pool is exhausted.
    ///
    /// # Errors
    /// Returns the backend's connection error unchanged, or `ConnectionError` if a
    /// configured acquire timeout elapses.
    pub async fn acquire(&self) -> Result<PooledConn, SqlContextError> {
        let conn = match &self.backend {
            #[cfg(feature = "sqlite")]
            BackendPool::Sqlite(pool) => PooledConn::Sqlite(pool.get_owned().await?),
            #[cfg(feature = "postgres")]
            BackendPool::Postgres(pool) => PooledConn::Postgres(pool.get_owned().await?),
        };
        debug!(leased = self.state().leased(), "leased pooled connection");
        Ok(conn)
    }

    #[must_use]
    pub fn state(&self) -> PoolState {
        let (connections, idle_connections) = match &self.backend {
            #[cfg(feature = "sqlite")]
            BackendPool::Sqlite(pool) => {
                let state = pool.state();
                (state.connections, state.idle_connections)
            }
            #[cfg(feature = "postgres")]
            BackendPool::Postgres(pool) => {
                let state = pool.state();
                (state.connections, state.idle_connections)
            }
        };
        PoolState {
            max_size: self.max_size,
            connections,
            idle_connections,
        }
    }

    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        match &self.backend {
            #[cfg(feature = "sqlite")]
            BackendPool::Sqlite(_) => DatabaseType::Sqlite,
            #[cfg(feature = "postgres")]
            BackendPool::Postgres(_) => DatabaseType::Postgres,
        }
    }

    #[must_use]
    pub fn backend(&self) -> &BackendPool {
        &self.backend
    }
}
