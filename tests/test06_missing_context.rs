#![cfg(feature = "sqlite")]

mod common;

use common::sqlite_db;
use sql_request_context::context;
use sql_request_context::prelude::*;

#[tokio::test]
async fn queries_outside_a_request_fail_loudly() -> Result<(), SqlContextError> {
    let t = sqlite_db(1).await?;

    let err = executor::run("SELECT 1", &[]).await.expect_err("no context");
    assert!(matches!(err, SqlContextError::MissingContext));
    assert!(err.to_string().starts_with("Configuration error"));

    assert!(matches!(
        executor::get("SELECT 1", &[]).await,
        Err(SqlContextError::MissingContext)
    ));
    assert!(matches!(
        executor::all("SELECT 1", &[]).await,
        Err(SqlContextError::MissingContext)
    ));
    assert!(matches!(
        executor::begin_transaction().await,
        Err(SqlContextError::MissingContext)
    ));
    assert!(context::try_current().is_none());

    // nothing was borrowed from the pool
    assert_eq!(t.db.state().leased(), 0);
    Ok(())
}

#[tokio::test]
async fn spawned_tasks_inherit_only_through_context_spawn() -> Result<(), SqlContextError> {
    let t = sqlite_db(2).await?;

    let (inherited, detached) = t
        .db
        .scope(async {
            let inherited =
                context::spawn(async { executor::get("SELECT 1 AS one", &[]).await });
            let detached = tokio::spawn(async { executor::get("SELECT 1 AS one", &[]).await });
            (
                inherited.await.expect("inherited task"),
                detached.await.expect("detached task"),
            )
        })
        .await;

    assert!(inherited?.is_some());
    assert!(matches!(detached, Err(SqlContextError::MissingContext)));
    Ok(())
}

#[tokio::test]
async fn nested_scopes_use_the_innermost_context() -> Result<(), SqlContextError> {
    let t = sqlite_db(2).await?;

    t.db.scope(async {
        let outer = context::current()?;
        executor::run("BEGIN", &[]).await?;

        t.db.scope(async {
            let inner = context::current()?;
            assert!(!std::sync::Arc::ptr_eq(&outer, &inner));
            assert!(!inner.is_transaction_active().await);
            Ok::<_, SqlContextError>(())
        })
        .await?;

        assert!(outer.is_transaction_active().await);
        executor::run("ROLLBACK", &[]).await?;
        Ok::<_, SqlContextError>(())
    })
    .await?;
    Ok(())
}
