//! Convenient imports for common functionality.
//!
//! Brings in the database handle, configuration, value and result types, and the
//! [`executor`](crate::executor) module so route code can write `executor::run(...)`.

pub use crate::config::DatabaseConfig;
pub use crate::context::{CleanupOutcome, RequestContext};
pub use crate::database::Database;
pub use crate::error::SqlContextError;
pub use crate::executor;
pub use crate::pool::{ConnectionPool, PoolState};
pub use crate::results::{CustomDbRow, ResultSet, RunResult};
pub use crate::types::{DatabaseType, RowValues};

#[cfg(feature = "axum")]
pub use crate::http::{CurrentContext, request_context};
