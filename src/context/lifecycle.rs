use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::runtime::Handle;
use tracing::{debug, error, warn};

use super::{RequestContext, TxState};

/// What the end-of-request cleanup did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Cleanup had already run for this context; nothing was done.
    AlreadyCleaned,
    /// No transaction was open.
    Idle,
    /// An open transaction was rolled back and its connection released.
    RolledBack,
    /// Rolling back failed. The connection was released anyway and the pool discards it
    /// if it is no longer usable.
    RollbackFailed(String),
}

impl CleanupOutcome {
    /// Whether this call found a transaction left open by the request.
    #[must_use]
    pub fn found_open_transaction(&self) -> bool {
        matches!(self, Self::RolledBack | Self::RollbackFailed(_))
    }
}

impl RequestContext {
    /// Roll back anything the request left open and release its connection.
    ///
    /// Runs at most once per context; later calls return
    /// [`CleanupOutcome::AlreadyCleaned`]. Errors are logged and reported in the outcome,
    /// never returned, and once this has run the context refuses to open new transactions.
    pub async fn finish(&self) -> CleanupOutcome {
        if self.cleaned.swap(true, Ordering::AcqRel) {
            return CleanupOutcome::AlreadyCleaned;
        }

        let mut state = self.state.lock().await;
        let TxState::InTransaction(conn) = &*state else {
            return CleanupOutcome::Idle;
        };

        // stays InTransaction until the rollback was attempted; Drop covers cancellation here
        let outcome = match conn.rollback().await {
            Ok(()) => {
                debug!("request ended with an open transaction; rolled back");
                CleanupOutcome::RolledBack
            }
            Err(e) => {
                warn!(error = %e, "rollback during request cleanup failed; releasing connection");
                CleanupOutcome::RollbackFailed(e.to_string())
            }
        };
        *state = TxState::Idle;
        outcome
    }
}

/// Runs [`RequestContext::finish`] if the request future is dropped before it could.
///
/// Covers client disconnects, aborted tasks and panicking handlers. Cleanup is async, so it
/// is spawned onto the current runtime.
pub(crate) struct CleanupGuard {
    ctx: Option<Arc<RequestContext>>,
}

impl CleanupGuard {
    pub(crate) fn new(ctx: Arc<RequestContext>) -> Self {
        Self { ctx: Some(ctx) }
    }

    /// Consume the guard after cleanup ran on the normal path.
    pub(crate) fn disarm(mut self) {
        self.ctx = None;
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let Some(ctx) = self.ctx.take() else {
            return;
        };
        if ctx.is_cleaned() {
            return;
        }
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let outcome = ctx.finish().await;
                    if outcome.found_open_transaction() {
                        warn!(?outcome, "request terminated abruptly with an open transaction");
                    }
                });
            }
            Err(_) => {
                error!("request context dropped outside a tokio runtime; cleanup cannot run");
            }
        }
    }
}

impl Drop for RequestContext {
    fn drop(&mut self) {
        let TxState::InTransaction(conn) = std::mem::replace(self.state.get_mut(), TxState::Idle)
        else {
            return;
        };
        warn!("request context dropped with an open transaction; rolling back");
        if let Ok(handle) = Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = conn.rollback().await {
                    warn!(error = %e, "rollback of abandoned transaction failed");
                }
            });
        } else {
            // The pool re-checks the connection on return and discards it if still open.
            error!("no tokio runtime to roll back an abandoned transaction");
            drop(conn);
        }
    }
}
