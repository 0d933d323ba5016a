#![cfg(feature = "sqlite")]

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use common::{count_items, sqlite_db};
use sql_request_context::prelude::*;

#[tokio::test]
async fn exhausted_pool_makes_callers_wait() -> Result<(), SqlContextError> {
    let t = sqlite_db(1).await?;

    let holder = t.db.new_context();
    holder.begin_transaction().await?;
    assert_eq!(t.db.state().leased(), 1);

    let db = t.db.clone();
    let waiter = tokio::spawn(async move {
        db.scope(async { executor::all("SELECT * FROM items", &[]).await })
            .await
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!waiter.is_finished(), "second request must wait for the leased connection");
    assert_eq!(t.db.state().leased(), 1);

    holder.commit().await?;
    let rows = tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("waiter resumes once the connection is released")
        .expect("waiter task")?;
    assert!(rows.is_empty());
    assert_eq!(t.db.state().leased(), 0);
    Ok(())
}

#[tokio::test]
async fn acquire_timeout_surfaces_as_connection_error() -> Result<(), SqlContextError> {
    let dir = tempfile::tempdir().map_err(|e| SqlContextError::ConfigError(e.to_string()))?;
    let path = dir.path().join("timeout.db");
    let db = Database::open(
        DatabaseConfig::sqlite(path.to_string_lossy().into_owned())
            .with_max_connections(1)
            .with_acquire_timeout(Duration::from_millis(100)),
    )
    .await?;

    let holder = db.new_context();
    holder.begin_transaction().await?;

    let err = db
        .scope(async { executor::get("SELECT 1", &[]).await })
        .await
        .expect_err("pool is exhausted");
    assert!(matches!(err, SqlContextError::ConnectionError(_)));

    holder.rollback().await?;
    let row = db
        .scope(async { executor::get("SELECT 1 AS one", &[]).await })
        .await?;
    assert!(row.is_some());
    Ok(())
}

#[tokio::test]
async fn concurrent_requests_never_exceed_capacity() -> Result<(), SqlContextError> {
    const CAPACITY: u32 = 3;
    let t = sqlite_db(CAPACITY).await?;
    let peak = Arc::new(AtomicU32::new(0));

    let mut tasks = Vec::new();
    for i in 0..24_i64 {
        let db = t.db.clone();
        let peak = Arc::clone(&peak);
        tasks.push(tokio::spawn(async move {
            db.scope(async {
                executor::run("BEGIN", &[]).await?;
                peak.fetch_max(db.state().leased(), Ordering::SeqCst);
                executor::run(
                    "INSERT INTO items (name) VALUES (?1)",
                    &[RowValues::Text(format!("item-{i}"))],
                )
                .await?;
                tokio::time::sleep(Duration::from_millis(5)).await;
                peak.fetch_max(db.state().leased(), Ordering::SeqCst);
                // every third request forgets to commit
                if i % 3 != 0 {
                    executor::run("COMMIT", &[]).await?;
                }
                Ok::<_, SqlContextError>(())
            })
            .await
        }));
    }
    for task in tasks {
        task.await.expect("request task")?;
    }

    assert!(peak.load(Ordering::SeqCst) <= CAPACITY);
    assert_eq!(t.db.state().leased(), 0);
    assert!(t.db.state().connections <= CAPACITY);
    assert_eq!(count_items(&t.db).await?, 16);
    Ok(())
}

#[tokio::test]
async fn open_reports_unreachable_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing").join("nested.db");

    let err = Database::open(DatabaseConfig::sqlite(path.to_string_lossy().into_owned()))
        .await
        .expect_err("parent directory does not exist");
    assert!(matches!(err, SqlContextError::SqliteError(_)));

    let err = Database::open(DatabaseConfig::sqlite("app.db").with_max_connections(0))
        .await
        .expect_err("zero capacity");
    assert!(matches!(err, SqlContextError::ConfigError(_)));
}

#[tokio::test]
async fn close_releases_the_handle() -> Result<(), SqlContextError> {
    let t = sqlite_db(2).await?;
    let other = t.db.clone();
    t.db.close();

    // clones keep the pool alive
    assert_eq!(count_items(&other).await?, 0);
    assert_eq!(other.state().max_size, 2);
    assert_eq!(other.db_type(), DatabaseType::Sqlite);
    Ok(())
}
