use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("No metadata registered for entity \"{0}\"")]
    UnknownEntity(String),

    #[error("Entity \"{entity}\" has no field \"{field}\"")]
    UnknownField { entity: String, field: String },

    #[error("Entity \"{entity}\" has no association \"{association}\"")]
    UnknownAssociation { entity: String, association: String },

    #[error("Entity \"{0}\" declares no identifier")]
    MissingIdentifier(String),

    #[error("Entity \"{0}\" has a composite identifier, a single identifier is required")]
    CompositeIdentifier(String),

    #[error("Invalid metadata document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
