use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::error::SqlContextError;
use crate::types::DatabaseType;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Pool checkout wait used when no acquire timeout is configured.
///
/// bb8 always arms a checkout timer; a year is long enough to behave as "wait until a
/// connection comes back" while staying inside the range tokio timers accept.
pub(crate) const UNBOUNDED_ACQUIRE_WAIT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Connection settings for [`Database::open`](crate::Database::open).
///
/// Loadable from a config file through serde, or flattened into a host binary's CLI:
/// ```rust
/// use clap::Parser;
/// use sql_request_context::DatabaseConfig;
///
/// #[derive(Parser)]
/// struct Cli {
///     #[command(flatten)]
///     db: DatabaseConfig,
/// }
///
/// let cli = Cli::parse_from(["app", "--db-type", "sqlite", "--db-url", "app.db"]);
/// assert_eq!(cli.db.max_connections, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Args)]
pub struct DatabaseConfig {
    /// Database backend.
    #[arg(long = "db-type", value_enum)]
    pub db_type: DatabaseType,

    /// `SQLite`: path to the database file. `PostgreSQL`: a libpq-style connection string.
    #[arg(long = "db-url")]
    pub url: String,

    /// Maximum number of pooled connections.
    #[arg(long = "db-max-connections", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Give up waiting for a pooled connection after this many milliseconds.
    /// Unset means wait until one is returned.
    #[arg(long = "db-acquire-timeout-ms")]
    #[serde(default)]
    pub acquire_timeout_ms: Option<u64>,

    /// `SQLite` busy timeout applied to every connection.
    #[arg(long = "db-busy-timeout-ms", default_value_t = DEFAULT_BUSY_TIMEOUT_MS)]
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl DatabaseConfig {
    #[must_use]
    pub fn new(db_type: DatabaseType, url: impl Into<String>) -> Self {
        Self {
            db_type,
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_ms: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    #[must_use]
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self::new(DatabaseType::Sqlite, path)
    }

    #[must_use]
    pub fn postgres(url: impl Into<String>) -> Self {
        Self::new(DatabaseType::Postgres, url)
    }

    #[must_use]
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    #[must_use]
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn acquire_timeout(&self) -> Duration {
        match self.acquire_timeout_ms {
            Some(ms) => Duration::from_millis(ms).min(UNBOUNDED_ACQUIRE_WAIT),
            None => UNBOUNDED_ACQUIRE_WAIT,
        }
    }

    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Check the settings before any connection is attempted.
    ///
    /// # Errors
    /// Returns `SqlContextError::ConfigError` for a backend not compiled in, an empty URL, a
    /// zero-sized pool, or a zero acquire timeout.
    pub fn validate(&self) -> Result<(), SqlContextError> {
        if !self.db_type.is_enabled() {
            return Err(SqlContextError::ConfigError(format!(
                "{:?} support is not enabled in this build",
                self.db_type
            )));
        }
        if self.url.trim().is_empty() {
            return Err(SqlContextError::ConfigError(
                "database url is required".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(SqlContextError::ConfigError(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.acquire_timeout_ms == Some(0) {
            return Err(SqlContextError::ConfigError(
                "acquire_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
