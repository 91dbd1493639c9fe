use model::metadata::error::MetadataError;
use thiserror::Error;

/// Errors raised while lowering an entity query into SQL.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Query has no FROM entity")]
    MissingFrom,

    #[error("Query selects from {0} entities, only one root entity is supported")]
    MultipleFrom(usize),

    #[error("Unknown alias '{0}' in query")]
    UnknownAlias(String),

    #[error("Field reference '{0}' must consist of an alias and a field separated with a period")]
    InvalidFieldReference(String),

    #[error("Join path '{0}' must consist of an alias and an association separated with a period")]
    InvalidJoinPath(String),

    #[error("Association '{association}' of entity '{entity}' declares no join columns")]
    MissingJoinColumns { entity: String, association: String },

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
}
