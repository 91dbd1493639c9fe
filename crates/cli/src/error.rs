use connectors::error::ConnectorError;
use grid::error::GridError;
use model::metadata::error::MetadataError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read input file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to load entity metadata: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Connection failed: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Unknown SQL dialect: {0}")]
    UnknownDialect(String),

    #[error("Invalid request parameter '{0}', expected key=value")]
    InvalidParam(String),

    #[error("Request parameters must be a JSON object")]
    InvalidRequest,
}
