//! Per-request transactional state.
//!
//! A [`RequestContext`] owns at most one leased connection, and only while a transaction is
//! open. Statements issued outside a transaction borrow a pooled connection for that one
//! statement, so an idle request never pins a connection.

mod lifecycle;
pub mod propagation;

use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::debug;

use crate::classify::{self, StatementKind};
use crate::error::SqlContextError;
use crate::pool::{ConnectionPool, PooledConn};
use crate::results::{CustomDbRow, ResultSet, RunResult};
use crate::types::RowValues;

pub use lifecycle::CleanupOutcome;
pub(crate) use lifecycle::CleanupGuard;
pub use propagation::{current, scope, spawn, try_current};

/// Transaction state of a request. A connection is held exactly while a transaction is open.
pub(crate) enum TxState {
    Idle,
    InTransaction(PooledConn),
}

/// How a statement reaches the database: through the request's open transaction, or on a
/// connection borrowed for this statement alone.
enum Lease<'a> {
    Transaction(MappedMutexGuard<'a, PooledConn>),
    Single(PooledConn),
}

impl Deref for Lease<'_> {
    type Target = PooledConn;

    fn deref(&self) -> &PooledConn {
        match self {
            Lease::Transaction(conn) => &**conn,
            Lease::Single(conn) => conn,
        }
    }
}

/// The transactional state of one in-flight request.
///
/// Share it as `Arc<RequestContext>`: the HTTP hook and [`crate::Database::scope`] install it
/// as the task's current context, and the free functions in [`crate::executor`] find it
/// there. Code that holds the context can call the same operations as methods.
pub struct RequestContext {
    pool: ConnectionPool,
    state: Mutex<TxState>,
    cleaned: AtomicBool,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let in_transaction = match self.state.try_lock() {
            Ok(state) => Some(matches!(*state, TxState::InTransaction(_))),
            Err(_) => None,
        };
        f.debug_struct("RequestContext")
            .field("in_transaction", &in_transaction)
            .field("cleaned", &self.is_cleaned())
            .finish_non_exhaustive()
    }
}

impl RequestContext {
    #[must_use]
    pub fn new(pool: ConnectionPool) -> Self {
        Self {
            pool,
            state: Mutex::new(TxState::Idle),
            cleaned: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub async fn is_transaction_active(&self) -> bool {
        matches!(*self.state.lock().await, TxState::InTransaction(_))
    }

    /// Whether this context currently holds a leased connection.
    ///
    /// Always equal to [`Self::is_transaction_active`]: the connection is leased by `BEGIN`
    /// and released by `COMMIT`, `ROLLBACK`, or cleanup.
    pub async fn holds_connection(&self) -> bool {
        self.is_transaction_active().await
    }

    /// Whether the end-of-request cleanup has already run.
    #[must_use]
    pub fn is_cleaned(&self) -> bool {
        self.cleaned.load(Ordering::Acquire)
    }

    /// Execute a statement and return its normalised outcome.
    ///
    /// `BEGIN`, `START TRANSACTION`, `COMMIT` and `ROLLBACK` are intercepted and drive the
    /// request's transaction instead of being sent as written; they report
    /// [`RunResult::none`]. Anything else runs inside the open transaction if there is
    /// one, or on a connection borrowed for this statement.
    ///
    /// # Errors
    /// Returns the backend error unchanged; a failing statement leaves an open transaction
    /// open.
    pub async fn run(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<RunResult, SqlContextError> {
        if self.apply_control(classify::classify(query)).await? {
            return Ok(RunResult::none());
        }
        let conn = self.lease().await?;
        conn.run(query, params).await
    }

    /// Execute a query and return its first row; `None` when nothing matches.
    ///
    /// # Errors
    /// Returns the backend error unchanged.
    pub async fn get(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<Option<CustomDbRow>, SqlContextError> {
        if self.apply_control(classify::classify(query)).await? {
            return Ok(None);
        }
        let conn = self.lease().await?;
        conn.get(query, params).await
    }

    /// Execute a query and return every row in order.
    ///
    /// # Errors
    /// Returns the backend error unchanged.
    pub async fn all(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlContextError> {
        if self.apply_control(classify::classify(query)).await? {
            return Ok(ResultSet::default());
        }
        let conn = self.lease().await?;
        conn.all(query, params).await
    }

    /// Execute a multi-statement script, routed like any ordinary statement.
    ///
    /// A script that opens a transaction further in is not detected here; the pools refuse
    /// to hand such a connection to another request.
    ///
    /// # Errors
    /// Returns `ExecutionError` if the script starts with a transaction-control statement,
    /// otherwise the backend error unchanged.
    pub async fn execute_batch(&self, query: &str) -> Result<(), SqlContextError> {
        if classify::classify(query).is_transaction_control() {
            return Err(SqlContextError::ExecutionError(
                "transaction control is not allowed in a batch; use run() or begin_transaction()"
                    .to_string(),
            ));
        }
        let conn = self.lease().await?;
        conn.execute_batch(query).await
    }

    /// Open a transaction on a freshly leased connection. A no-op if one is already open.
    ///
    /// Waits while the pool is exhausted.
    ///
    /// # Errors
    /// Returns `ContextClosed` once cleanup has run, or the pool/backend error.
    pub async fn begin_transaction(&self) -> Result<(), SqlContextError> {
        let mut state = self.state.lock().await;
        // checked under the lock so cleanup cannot miss a transaction opened concurrently
        if self.is_cleaned() {
            return Err(SqlContextError::ContextClosed);
        }
        if matches!(*state, TxState::InTransaction(_)) {
            debug!("begin ignored: transaction already active");
            return Ok(());
        }
        // stored before BEGIN is sent, so a request dropped mid-await is still rolled back
        *state = TxState::InTransaction(self.pool.acquire().await?);
        let begun = match &*state {
            TxState::InTransaction(conn) => conn.begin().await,
            TxState::Idle => Ok(()),
        };
        if let Err(e) = begun {
            *state = TxState::Idle;
            return Err(e);
        }
        debug!("transaction started");
        Ok(())
    }

    /// Commit the open transaction and release its connection. A no-op when idle.
    ///
    /// # Errors
    /// Returns the backend error; the transaction then stays open so it can still be rolled
    /// back.
    pub async fn commit(&self) -> Result<(), SqlContextError> {
        let mut state = self.state.lock().await;
        let TxState::InTransaction(conn) = &*state else {
            debug!("commit ignored: no active transaction");
            return Ok(());
        };
        conn.commit().await?;
        *state = TxState::Idle;
        debug!("transaction committed; connection released");
        Ok(())
    }

    /// Roll back the open transaction and release its connection. A no-op when idle.
    ///
    /// # Errors
    /// Returns the backend error; the transaction then stays open for the cleanup path.
    pub async fn rollback(&self) -> Result<(), SqlContextError> {
        let mut state = self.state.lock().await;
        let TxState::InTransaction(conn) = &*state else {
            debug!("rollback ignored: no active transaction");
            return Ok(());
        };
        conn.rollback().await?;
        *state = TxState::Idle;
        debug!("transaction rolled back; connection released");
        Ok(())
    }

    /// Performs the control action for `kind`; `false` means the statement is ordinary.
    async fn apply_control(&self, kind: StatementKind) -> Result<bool, SqlContextError> {
        match kind {
            StatementKind::Begin => self.begin_transaction().await?,
            StatementKind::Commit => self.commit().await?,
            StatementKind::Rollback => self.rollback().await?,
            StatementKind::Ordinary => return Ok(false),
        }
        Ok(true)
    }

    async fn lease(&self) -> Result<Lease<'_>, SqlContextError> {
        let state = self.state.lock().await;
        match MutexGuard::try_map(state, |state: &mut TxState| match state {
            TxState::InTransaction(conn) => Some(conn),
            TxState::Idle => None,
        }) {
            Ok(conn) => Ok(Lease::Transaction(conn)),
            Err(idle) => {
                drop(idle);
                Ok(Lease::Single(self.pool.acquire().await?))
            }
        }
    }
}
