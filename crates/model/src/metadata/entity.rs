use crate::{core::data_type::FieldType, metadata::error::MetadataError};
use serde::{Deserialize, Serialize};

/// Mapping information for one persisted entity type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityMetadata {
    /// Fully qualified entity name, e.g. `App\Entity\Book` or `Book`.
    pub name: String,
    pub table: String,
    pub identifier: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
    #[serde(default)]
    pub associations: Vec<AssociationMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldMapping {
    pub name: String,
    /// Database column, defaults to the field name.
    #[serde(default)]
    pub column: Option<String>,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
}

fn default_field_type() -> FieldType {
    FieldType::String
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    ManyToOne,
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl AssociationKind {
    pub fn is_to_many(&self) -> bool {
        matches!(self, AssociationKind::OneToMany | AssociationKind::ManyToMany)
    }
}

/// Equality condition between a column of the owning side (`source`) and a
/// column of the associated side (`target`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinColumn {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssociationMapping {
    pub name: String,
    pub target_entity: String,
    pub kind: AssociationKind,
    #[serde(default)]
    pub join_columns: Vec<JoinColumn>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl FieldMapping {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            column: None,
            field_type,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_column(mut self, column: &str) -> Self {
        self.column = Some(column.to_string());
        self
    }

    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }
}

impl AssociationMapping {
    /// A to-one association whose foreign key lives on the owning table.
    pub fn many_to_one(name: &str, target_entity: &str, fk_column: &str, target_id: &str) -> Self {
        Self {
            name: name.to_string(),
            target_entity: target_entity.to_string(),
            kind: AssociationKind::ManyToOne,
            join_columns: vec![JoinColumn {
                source: fk_column.to_string(),
                target: target_id.to_string(),
            }],
            nullable: true,
        }
    }

    /// A to-many association whose foreign key lives on the target table.
    pub fn one_to_many(name: &str, target_entity: &str, source_id: &str, fk_column: &str) -> Self {
        Self {
            name: name.to_string(),
            target_entity: target_entity.to_string(),
            kind: AssociationKind::OneToMany,
            join_columns: vec![JoinColumn {
                source: source_id.to_string(),
                target: fk_column.to_string(),
            }],
            nullable: true,
        }
    }

    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }
}

impl EntityMetadata {
    pub fn new(name: &str, table: &str, identifier: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            identifier: vec![identifier.to_string()],
            fields: Vec::new(),
            associations: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldMapping) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_association(mut self, association: AssociationMapping) -> Self {
        self.associations.push(association);
        self
    }

    /// Class name without namespace, e.g. `Book` for `App\Entity\Book`.
    pub fn short_name(&self) -> &str {
        self.name
            .rsplit(['\\', ':', '.'])
            .find(|part| !part.is_empty())
            .unwrap_or(&self.name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn association(&self, name: &str) -> Option<&AssociationMapping> {
        self.associations.iter().find(|a| a.name == name)
    }

    pub fn association_or_err(&self, name: &str) -> Result<&AssociationMapping, MetadataError> {
        self.association(name)
            .ok_or_else(|| MetadataError::UnknownAssociation {
                entity: self.name.clone(),
                association: name.to_string(),
            })
    }

    pub fn field_or_err(&self, name: &str) -> Result<&FieldMapping, MetadataError> {
        self.field(name).ok_or_else(|| MetadataError::UnknownField {
            entity: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// First identifier field, the one the grid uses to identify rows.
    pub fn identifier_field(&self) -> Result<&str, MetadataError> {
        self.identifier
            .first()
            .map(String::as_str)
            .ok_or_else(|| MetadataError::MissingIdentifier(self.name.clone()))
    }

    pub fn single_identifier_field(&self) -> Result<&str, MetadataError> {
        if self.identifier.len() > 1 {
            return Err(MetadataError::CompositeIdentifier(self.name.clone()));
        }
        self.identifier_field()
    }
}
