// SQLite backend
//
// - config: bb8 connection manager and pool construction
// - params: parameter conversion from `RowValues`
// - query: row extraction and result building
// - executor: statement execution on a pooled connection (blocking work off the runtime)

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{SharedSqliteConnection, SqliteManager};
pub use query::build_result_set;
