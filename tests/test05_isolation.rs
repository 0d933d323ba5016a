#![cfg(feature = "sqlite")]

mod common;

use common::{item_names, sqlite_db};
use sql_request_context::prelude::*;

async fn names(ctx: &RequestContext) -> Result<Vec<String>, SqlContextError> {
    let rs = ctx.all("SELECT name FROM items ORDER BY id", &[]).await?;
    Ok(rs
        .iter()
        .filter_map(|r| r.get("name").and_then(RowValues::as_text).map(str::to_owned))
        .collect())
}

/// Two requests with open transactions each see their own writes and not the other's.
#[tokio::test]
async fn concurrent_transactions_are_isolated() -> Result<(), SqlContextError> {
    let t = sqlite_db(4).await?;
    let a = t.db.new_context();
    let b = t.db.new_context();

    // A writes while B holds a read snapshot
    a.run("BEGIN", &[]).await?;
    a.run("INSERT INTO items (name) VALUES ('from-a')", &[]).await?;
    b.run("BEGIN", &[]).await?;
    assert!(names(&b).await?.is_empty());
    assert_eq!(names(&a).await?, ["from-a"]);
    assert_eq!(t.db.state().leased(), 2);
    a.run("COMMIT", &[]).await?;
    b.run("COMMIT", &[]).await?;

    // and the other way round
    b.run("BEGIN", &[]).await?;
    b.run("INSERT INTO items (name) VALUES ('from-b')", &[]).await?;
    a.run("BEGIN", &[]).await?;
    assert_eq!(names(&a).await?, ["from-a"]);
    assert_eq!(names(&b).await?, ["from-a", "from-b"]);
    b.run("COMMIT", &[]).await?;
    a.run("COMMIT", &[]).await?;

    assert_eq!(a.finish().await, CleanupOutcome::Idle);
    assert_eq!(b.finish().await, CleanupOutcome::Idle);
    assert_eq!(item_names(&t.db).await?, ["from-a", "from-b"]);
    assert_eq!(t.db.state().leased(), 0);
    Ok(())
}

/// A request that fails mid-transaction does not disturb its neighbour.
#[tokio::test]
async fn cleanup_of_one_request_leaves_others_intact() -> Result<(), SqlContextError> {
    let t = sqlite_db(4).await?;
    let keep = t.db.new_context();
    let abandon = t.db.new_context();

    abandon.begin_transaction().await?;
    abandon.run("INSERT INTO items (name) VALUES ('abandoned')", &[]).await?;
    assert_eq!(abandon.finish().await, CleanupOutcome::RolledBack);

    keep.begin_transaction().await?;
    keep.run("INSERT INTO items (name) VALUES ('kept')", &[]).await?;
    keep.commit().await?;

    assert_eq!(item_names(&t.db).await?, ["kept"]);
    Ok(())
}
