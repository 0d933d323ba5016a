#![cfg(feature = "sqlite")]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{count_items, durable_count, sqlite_db, wait_until_released};
use sql_request_context::prelude::*;
use tokio::sync::oneshot;

#[tokio::test]
async fn finish_runs_once() -> Result<(), SqlContextError> {
    let t = sqlite_db(2).await?;
    let ctx = t.db.new_context();

    ctx.run("BEGIN", &[]).await?;
    ctx.run("INSERT INTO items (name) VALUES ('x')", &[]).await?;

    let first = ctx.finish().await;
    assert_eq!(first, CleanupOutcome::RolledBack);
    assert!(first.found_open_transaction());
    assert!(ctx.is_cleaned());
    assert!(!ctx.holds_connection().await);
    assert_eq!(t.db.state().leased(), 0);

    assert_eq!(ctx.finish().await, CleanupOutcome::AlreadyCleaned);
    assert_eq!(ctx.finish().await, CleanupOutcome::AlreadyCleaned);
    assert_eq!(count_items(&t.db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn finish_on_idle_context_touches_nothing() -> Result<(), SqlContextError> {
    let t = sqlite_db(1).await?;
    let ctx = t.db.new_context();
    ctx.run("INSERT INTO items (name) VALUES ('plain')", &[]).await?;

    assert_eq!(ctx.finish().await, CleanupOutcome::Idle);
    assert_eq!(count_items(&t.db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn closed_context_refuses_new_transactions() -> Result<(), SqlContextError> {
    let t = sqlite_db(1).await?;
    let ctx = t.db.new_context();
    ctx.finish().await;

    let err = ctx.run("BEGIN", &[]).await.expect_err("context already cleaned");
    assert!(matches!(err, SqlContextError::ContextClosed));
    assert!(!ctx.is_transaction_active().await);

    // statements outside a transaction still work
    ctx.run("INSERT INTO items (name) VALUES ('late')", &[]).await?;
    assert_eq!(t.db.state().leased(), 0);
    assert_eq!(count_items(&t.db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn aborted_request_is_rolled_back() -> Result<(), SqlContextError> {
    let t = sqlite_db(2).await?;
    let (ready_tx, ready_rx) = oneshot::channel();

    let db = t.db.clone();
    let request = tokio::spawn(async move {
        db.scope(async move {
            executor::run("BEGIN", &[]).await?;
            executor::run("INSERT INTO items (name) VALUES ('abandoned')", &[]).await?;
            let _ = ready_tx.send(());
            std::future::pending::<()>().await;
            Ok::<_, SqlContextError>(())
        })
        .await
    });

    ready_rx.await.expect("request reached its await point");
    assert_eq!(t.db.state().leased(), 1);

    // what happens when the client disconnects mid-request
    request.abort();
    assert!(request.await.is_err_and(|e| e.is_cancelled()));

    wait_until_released(&t.db).await;
    assert_eq!(count_items(&t.db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn panicking_handler_is_rolled_back() -> Result<(), SqlContextError> {
    let t = sqlite_db(2).await?;

    let db = t.db.clone();
    let request = tokio::spawn(async move {
        db.scope(async {
            executor::run("BEGIN", &[]).await?;
            executor::run("INSERT INTO items (name) VALUES ('crashed')", &[]).await?;
            let crash = true;
            if crash {
                panic!("handler bug");
            }
            Ok::<_, SqlContextError>(())
        })
        .await
    });

    assert!(request.await.is_err_and(|e| e.is_panic()));

    wait_until_released(&t.db).await;
    assert_eq!(count_items(&t.db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn dropped_context_rolls_back_its_transaction() -> Result<(), SqlContextError> {
    let t = sqlite_db(2).await?;

    let ctx = t.db.new_context();
    ctx.begin_transaction().await?;
    ctx.run("INSERT INTO items (name) VALUES ('orphan')", &[]).await?;
    assert_eq!(Arc::strong_count(&ctx), 1);
    drop(ctx);

    wait_until_released(&t.db).await;
    assert_eq!(count_items(&t.db).await?, 0);

    // the connection is usable by the next request
    t.db.scope(async {
        executor::run("BEGIN", &[]).await?;
        executor::run("INSERT INTO items (name) VALUES ('next')", &[]).await?;
        executor::run("COMMIT", &[]).await
    })
    .await?;
    assert_eq!(count_items(&t.db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn request_cancelled_during_begin_leaves_pool_clean() -> Result<(), SqlContextError> {
    let t = sqlite_db(1).await?;

    for i in 0..40u64 {
        let abandoned = t.db.scope(async {
            executor::run("BEGIN", &[]).await?;
            std::future::pending::<()>().await;
            Ok::<_, SqlContextError>(())
        });
        let _ = tokio::time::timeout(Duration::from_micros(i * 5), abandoned).await;

        t.db.scope(async {
            executor::run("INSERT INTO items (name) VALUES ('kept')", &[]).await
        })
        .await?;
        let expected = i64::try_from(i + 1).unwrap_or(i64::MAX);
        assert_eq!(durable_count(&t).await?, expected, "iteration {i}");
    }
    wait_until_released(&t.db).await;
    Ok(())
}
