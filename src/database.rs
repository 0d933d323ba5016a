use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::context::{self, CleanupGuard, RequestContext};
use crate::error::SqlContextError;
use crate::pool::{ConnectionPool, PoolState};
use crate::types::DatabaseType;

/// Process-wide database handle: the connection pool plus the request lifecycle built on it.
///
/// Open it once at startup and hand clones to whatever serves requests (axum router state,
/// a worker loop). Each request then runs inside [`Database::scope`], or behind the
/// [`crate::http::request_context`] middleware.
///
/// ```rust,no_run
/// use sql_request_context::prelude::*;
///
/// # async fn demo() -> Result<(), SqlContextError> {
/// let db = Database::open(DatabaseConfig::sqlite("app.db").with_max_connections(4)).await?;
///
/// let inserted = db
///     .scope(async {
///         executor::run("BEGIN", &[]).await?;
///         let res = executor::run(
///             "INSERT INTO notes (body) VALUES (?1)",
///             &[RowValues::Text("hello".into())],
///         )
///         .await?;
///         executor::run("COMMIT", &[]).await?;
///         Ok::<_, SqlContextError>(res.id)
///     })
///     .await?;
/// # let _ = inserted;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    /// Validate `config`, build the pool, and check that the database is reachable.
    ///
    /// # Errors
    /// Returns `ConfigError` for an invalid configuration, or the backend's connection error
    /// unchanged when the database cannot be opened.
    pub async fn open(config: DatabaseConfig) -> Result<Self, SqlContextError> {
        config.validate()?;
        let pool = ConnectionPool::connect(&config).await?;
        info!(
            db_type = ?config.db_type,
            max_connections = config.max_connections,
            "database pool ready"
        );
        Ok(Self { pool })
    }

    #[must_use]
    pub fn from_pool(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    #[must_use]
    pub fn state(&self) -> PoolState {
        self.pool.state()
    }

    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        self.pool.db_type()
    }

    /// A fresh, idle request context on this database's pool.
    ///
    /// The caller owns its lifecycle: install it with [`context::scope`] and call
    /// [`RequestContext::finish`] when the request ends. [`Database::scope`] does both.
    #[must_use]
    pub fn new_context(&self) -> Arc<RequestContext> {
        Arc::new(RequestContext::new(self.pool.clone()))
    }

    /// Run `fut` as one request.
    ///
    /// A new context is installed for the duration of `fut`; when it completes, any
    /// transaction it left open is rolled back and its connection released. If `fut` is
    /// dropped early or panics, the same cleanup is spawned onto the runtime.
    pub async fn scope<F>(&self, fut: F) -> F::Output
    where
        F: Future,
    {
        let ctx = self.new_context();
        let guard = CleanupGuard::new(Arc::clone(&ctx));

        let output = context::scope(Arc::clone(&ctx), fut).await;

        let outcome = ctx.finish().await;
        guard.disarm();
        debug!(?outcome, "request context finished");
        output
    }

    /// Drop this handle's reference to the pool.
    ///
    /// Connections close once every clone of the handle (and every context built from it)
    /// has been dropped.
    pub fn close(self) {
        debug!(state = ?self.pool.state(), "closing database handle");
        drop(self);
    }
}
