use grid::error::StorageError;
use thiserror::Error;

/// Errors happening while setting up a database connection.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),
}

impl From<ConnectorError> for StorageError {
    fn from(err: ConnectorError) -> Self {
        StorageError::Connection(err.to_string())
    }
}

/// Maps a driver error onto the storage error the grid understands.
pub(crate) fn storage_error(err: tokio_postgres::Error) -> StorageError {
    if err.is_closed() {
        return StorageError::Connection(err.to_string());
    }
    match err.code() {
        Some(code) if code.code().starts_with("23") => StorageError::Constraint(err.to_string()),
        _ => StorageError::Query(err.to_string()),
    }
}
