//! Ambient "current request context" for the running task.
//!
//! The context rides in tokio task-local storage, so it follows the request's future across
//! every `.await` without being passed through handler signatures. Tasks spawned with
//! [`tokio::spawn`] start with no context; use [`spawn`] to carry it over.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::task::futures::TaskLocalFuture;

use super::RequestContext;
use crate::error::SqlContextError;

tokio::task_local! {
    static CURRENT_CONTEXT: Arc<RequestContext>;
}

/// The request context installed for the running task.
///
/// # Errors
/// Returns [`SqlContextError::MissingContext`] when called outside a request scope. There is
/// no fallback to an unmanaged connection.
pub fn current() -> Result<Arc<RequestContext>, SqlContextError> {
    CURRENT_CONTEXT
        .try_with(Arc::clone)
        .map_err(|_| SqlContextError::MissingContext)
}

#[must_use]
pub fn try_current() -> Option<Arc<RequestContext>> {
    CURRENT_CONTEXT.try_with(Arc::clone).ok()
}

/// Run `fut` with `ctx` as its current request context.
///
/// Scopes nest: an inner scope shadows the outer one until it completes. Installing a
/// context does not clean it up; see [`crate::Database::scope`] for that.
pub fn scope<F: Future>(
    ctx: Arc<RequestContext>,
    fut: F,
) -> TaskLocalFuture<Arc<RequestContext>, F> {
    CURRENT_CONTEXT.scope(ctx, fut)
}

/// Spawn a task that inherits the current request context, if there is one.
pub fn spawn<F>(fut: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match try_current() {
        Some(ctx) => tokio::spawn(CURRENT_CONTEXT.scope(ctx, fut)),
        None => tokio::spawn(fut),
    }
}
