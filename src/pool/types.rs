#[cfg(feature = "postgres")]
use crate::postgres::PgManager;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteManager;

/// Backend pool behind a [`super::ConnectionPool`].
///
/// Cloning is cheap: bb8 pools are reference counted.
#[derive(Clone)]
pub enum BackendPool {
    /// `SQLite` connection pool
    #[cfg(feature = "sqlite")]
    Sqlite(bb8::Pool<SqliteManager>),
    /// `PostgreSQL` connection pool
    #[cfg(feature = "postgres")]
    Postgres(bb8::Pool<PgManager>),
}

impl std::fmt::Debug for BackendPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(pool) => f.debug_tuple("Sqlite").field(&pool.state()).finish(),
            #[cfg(feature = "postgres")]
            Self::Postgres(pool) => f.debug_tuple("Postgres").field(&pool.state()).finish(),
        }
    }
}

/// Point-in-time view of a pool's occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    /// Configured capacity.
    pub max_size: u32,
    /// Open connections, leased or idle.
    pub connections: u32,
    /// Open connections sitting in the pool.
    pub idle_connections: u32,
}

impl PoolState {
    /// Connections currently leased to callers.
    #[must_use]
    pub fn leased(&self) -> u32 {
        self.connections.saturating_sub(self.idle_connections)
    }
}
