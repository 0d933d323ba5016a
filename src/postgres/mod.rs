// Postgres backend
//
// - config: bb8 connection manager over a tokio-postgres client
// - params: `ToSql` for `RowValues`
// - query: row extraction and result building
// - executor: statement execution on a pooled client

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::PgManager;
pub use params::Params as PostgresParams;
pub use query::{build_result_set_from_rows, postgres_extract_value};
