use model::metadata::error::MetadataError;
use query::error::QueryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    /// A table, column or adapter definition is unusable. Raised while the
    /// table is built or first queried, never recoverable per request.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures reported by the storage layer behind a `QueryExecutor` or a
/// unit of work.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
