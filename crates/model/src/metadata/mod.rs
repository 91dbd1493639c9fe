pub mod entity;
pub mod error;
pub mod registry;

use entity::EntityMetadata;
use error::MetadataError;

/// Source of entity mapping information. Must answer for every entity type
/// reachable through association traversal.
pub trait MetadataProvider: Send + Sync {
    fn metadata_for(&self, entity: &str) -> Result<&EntityMetadata, MetadataError>;
}
