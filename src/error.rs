use deadpool_sqlite::rusqlite;
use thiserror::Error;

/// Errors produced by the database layer.
#[derive(Debug, Error)]
pub enum GatewayDbError {
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error(transparent)]
    PoolError(#[from] deadpool_sqlite::PoolError),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

/// Convert InteractError to a more specific GatewayDbError
impl From<deadpool_sqlite::InteractError> for GatewayDbError {
    fn from(err: deadpool_sqlite::InteractError) -> Self {
        GatewayDbError::ConnectionError(format!("SQLite interact error: {err}"))
    }
}

/// Fatal startup errors. `launch` returns these instead of terminating the
/// process; only the binary decides to exit.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database id must not be empty")]
    EmptyDatabaseId,

    #[error("duplicate database id: {0}")]
    DuplicateDatabaseId(String),

    #[error("database '{db_id}': duplicate stored statement id: {statement_id}")]
    DuplicateStoredStatement { db_id: String, statement_id: String },

    #[error("database '{0}' is read-only but has init statements")]
    ReadOnlyInitStatements(String),

    #[error("database '{db_id}': init statement failed: {source}")]
    InitStatementFailed {
        db_id: String,
        source: GatewayDbError,
    },

    #[error("database '{db_id}': {source}")]
    Database {
        db_id: String,
        source: GatewayDbError,
    },

    #[error("failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),
}
