#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use sql_request_context::prelude::*;
use tempfile::TempDir;

/// A file-backed SQLite database that lives as long as the returned value.
pub struct TestDb {
    pub db: Database,
    pub path: PathBuf,
    _dir: TempDir,
}

pub async fn sqlite_db(max_connections: u32) -> Result<TestDb, SqlContextError> {
    let dir = tempfile::tempdir()
        .map_err(|e| SqlContextError::ConfigError(format!("tempdir: {e}")))?;
    let path = dir.path().join("context.db");
    let config = DatabaseConfig::sqlite(path.to_string_lossy().into_owned())
        .with_max_connections(max_connections);
    let db = Database::open(config).await?;
    db.scope(async {
        executor::execute_batch(
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
        )
        .await
    })
    .await?;
    Ok(TestDb { db, path, _dir: dir })
}

pub async fn count_items(db: &Database) -> Result<i64, SqlContextError> {
    let row = db
        .scope(async { executor::get("SELECT COUNT(*) AS cnt FROM items", &[]).await })
        .await?
        .ok_or_else(|| SqlContextError::ExecutionError("count returned no row".into()))?;
    row.get("cnt")
        .and_then(RowValues::as_int)
        .copied()
        .ok_or_else(|| SqlContextError::ExecutionError("missing cnt".into()))
}

/// Counts committed rows through a pool of its own, so a transaction left open in `t.db`
/// cannot make uncommitted rows look durable.
pub async fn durable_count(t: &TestDb) -> Result<i64, SqlContextError> {
    let config = DatabaseConfig::sqlite(t.path.to_string_lossy().into_owned())
        .with_max_connections(1);
    let observer = Database::open(config).await?;
    let n = count_items(&observer).await;
    observer.close();
    n
}

pub async fn item_names(db: &Database) -> Result<Vec<String>, SqlContextError> {
    let rs = db
        .scope(async { executor::all("SELECT name FROM items ORDER BY id", &[]).await })
        .await?;
    Ok(rs
        .iter()
        .filter_map(|row| row.get("name").and_then(RowValues::as_text).map(str::to_owned))
        .collect())
}

/// Waits for spawned cleanup to hand every leased connection back to the pool.
pub async fn wait_until_released(db: &Database) {
    for _ in 0..200 {
        if db.state().leased() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("connections still leased: {:?}", db.state());
}
