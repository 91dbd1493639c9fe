use crate::metadata::{MetadataProvider, entity::EntityMetadata, error::MetadataError};
use std::{collections::HashMap, path::Path};

/// In-process metadata store keyed by entity name. Lookups also accept the
/// entity short name when it is unambiguous.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    entities: HashMap<String, EntityMetadata>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, metadata: EntityMetadata) -> &mut Self {
        self.entities.insert(metadata.name.clone(), metadata);
        self
    }

    pub fn with(mut self, metadata: EntityMetadata) -> Self {
        self.register(metadata);
        self
    }

    /// Loads a JSON array of entity mappings.
    pub fn from_json(source: &str) -> Result<Self, MetadataError> {
        let entities: Vec<EntityMetadata> = serde_json::from_str(source)?;
        Ok(entities.into_iter().fold(Self::new(), Self::with))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityMetadata> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl MetadataProvider for MetadataRegistry {
    fn metadata_for(&self, entity: &str) -> Result<&EntityMetadata, MetadataError> {
        if let Some(meta) = self.entities.get(entity) {
            return Ok(meta);
        }

        let mut by_short_name = self.entities.values().filter(|m| m.short_name() == entity);
        match (by_short_name.next(), by_short_name.next()) {
            (Some(meta), None) => Ok(meta),
            _ => Err(MetadataError::UnknownEntity(entity.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data_type::FieldType;

    const DOCUMENT: &str = r#"[
        {
            "name": "App\\Entity\\Book",
            "table": "book",
            "identifier": ["id"],
            "fields": [
                { "name": "id", "type": "integer" },
                { "name": "title" }
            ],
            "associations": [
                {
                    "name": "author",
                    "target_entity": "App\\Entity\\Author",
                    "kind": "many_to_one",
                    "join_columns": [{ "source": "author_id", "target": "id" }]
                }
            ]
        },
        {
            "name": "App\\Entity\\Author",
            "table": "author",
            "identifier": ["id"],
            "fields": [{ "name": "id", "type": "integer" }, { "name": "name" }]
        }
    ]"#;

    #[test]
    fn test_load_from_json() {
        let registry = MetadataRegistry::from_json(DOCUMENT).unwrap();
        assert_eq!(registry.len(), 2);

        let book = registry.metadata_for("App\\Entity\\Book").unwrap();
        assert_eq!(book.field("title").unwrap().field_type, FieldType::String);
        assert!(book.association("author").unwrap().nullable);
    }

    #[test]
    fn test_short_name_lookup() {
        let registry = MetadataRegistry::from_json(DOCUMENT).unwrap();
        assert_eq!(registry.metadata_for("Author").unwrap().table, "author");
        assert!(matches!(
            registry.metadata_for("Publisher"),
            Err(MetadataError::UnknownEntity(_))
        ));
    }
}
