use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlContextError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    /// A query was issued with no request context installed for the current task.
    #[error(
        "Configuration error: no request context is active for this task; \
         run the code inside `Database::scope` or install the request-context middleware"
    )]
    MissingContext,

    /// The request context already ran its cleanup, so it cannot hold a new transaction.
    #[error("Request context already cleaned up; cannot begin a new transaction")]
    ContextClosed,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

#[cfg(feature = "sqlite")]
impl From<bb8::RunError<SqlContextError>> for SqlContextError {
    fn from(err: bb8::RunError<SqlContextError>) -> Self {
        match err {
            bb8::RunError::User(inner) => inner,
            bb8::RunError::TimedOut => {
                SqlContextError::ConnectionError("timed out waiting for a SQLite connection".into())
            }
        }
    }
}

#[cfg(feature = "postgres")]
impl From<bb8::RunError<tokio_postgres::Error>> for SqlContextError {
    fn from(err: bb8::RunError<tokio_postgres::Error>) -> Self {
        match err {
            bb8::RunError::User(inner) => SqlContextError::PostgresError(inner),
            bb8::RunError::TimedOut => SqlContextError::ConnectionError(
                "timed out waiting for a postgres connection".into(),
            ),
        }
    }
}
