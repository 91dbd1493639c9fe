//! Alias resolution for dotted field paths.
//!
//! The root entity is aliased `_` + its lowercase short name. Every joined
//! association gets the alias of its parent (left out when the parent is the
//! root) followed by `_` and the association name, so `department.manager`
//! from `_employee` joins `department` and then `department_manager`.

use crate::error::GridError;
use model::{
    core::data_type::FieldType,
    metadata::{MetadataProvider, entity::EntityMetadata},
};
use query::{ast::common::JoinKind, builder::query::QueryBuilder};
use std::collections::HashMap;
use tracing::debug;

pub fn root_alias(metadata: &EntityMetadata) -> String {
    format!("_{}", metadata.short_name().to_lowercase())
}

/// Alias of the join reached through `segment` from `parent`.
pub fn join_alias(parent: &str, segment: &str, root: &str) -> String {
    if parent == root {
        segment.to_string()
    } else {
        format!("{parent}_{segment}")
    }
}

/// Fields to select per alias, both in first-registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionSet {
    entries: Vec<(String, Vec<String>)>,
}

impl ProjectionSet {
    pub fn add(&mut self, alias: &str, field: &str) {
        match self.entries.iter_mut().find(|(a, _)| a == alias) {
            Some((_, fields)) => {
                if !fields.iter().any(|f| f == field) {
                    fields.push(field.to_string());
                }
            }
            None => self
                .entries
                .push((alias.to_string(), vec![field.to_string()])),
        }
    }

    pub fn fields(&self, alias: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, fields)| fields.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(alias, fields)| (alias.as_str(), fields.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinEntry {
    /// `parentAlias.association`
    pub key: String,
    pub alias: String,
    pub kind: JoinKind,
}

/// Joins keyed by `parentAlias.association`, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinRegistry {
    entries: Vec<JoinEntry>,
}

impl JoinRegistry {
    /// Registers a left join once per key. A second key claiming an alias
    /// that is already taken is rejected.
    pub fn register(&mut self, key: &str, alias: &str) -> Result<(), GridError> {
        if self.get(key).is_some() {
            return Ok(());
        }
        if let Some(existing) = self.entries.iter().find(|e| e.alias == alias) {
            return Err(GridError::Configuration(format!(
                "Join '{key}' would reuse alias '{alias}' already taken by '{}'",
                existing.key
            )));
        }
        self.entries.push(JoinEntry {
            key: key.to_string(),
            alias: alias.to_string(),
            kind: JoinKind::Left,
        });
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&JoinEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &JoinEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves dotted paths against the root entity, registering the joins and
/// projections each path needs.
pub struct AliasResolver<'a> {
    metadata: &'a dyn MetadataProvider,
    root: &'a EntityMetadata,
    root_alias: String,
    projections: ProjectionSet,
    joins: JoinRegistry,
}

impl<'a> AliasResolver<'a> {
    pub fn new(
        metadata: &'a dyn MetadataProvider,
        root: &'a EntityMetadata,
    ) -> Result<Self, GridError> {
        let root_alias = root_alias(root);
        let mut projections = ProjectionSet::default();
        projections.add(&root_alias, root.identifier_field()?);
        Ok(Self {
            metadata,
            root,
            root_alias,
            projections,
            joins: JoinRegistry::default(),
        })
    }

    pub fn root_alias(&self) -> &str {
        &self.root_alias
    }

    /// Returns the `(alias, field)` a path ends in.
    pub fn resolve(&mut self, path: &str) -> Result<(String, String), GridError> {
        let mut segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(GridError::Configuration(format!(
                "Field path '{path}' contains an empty segment"
            )));
        }
        if segments.len() > 1 && segments[0] == self.root_alias {
            segments.remove(0);
        }
        let Some((leaf, associations)) = segments.split_last() else {
            return Err(GridError::Configuration(format!("Field path '{path}' is empty")));
        };

        let mut alias = self.root_alias.clone();
        let mut entity = self.root;
        for segment in associations {
            let association = entity.association(segment).ok_or_else(|| {
                GridError::Configuration(format!(
                    "Cannot resolve '{path}': entity '{}' has no association '{segment}'",
                    entity.name
                ))
            })?;
            let next = join_alias(&alias, segment, &self.root_alias);
            self.joins.register(&format!("{alias}.{segment}"), &next)?;

            let target = self.metadata.metadata_for(&association.target_entity)?;
            self.projections.add(&next, target.identifier_field()?);
            alias = next;
            entity = target;
        }

        if !entity.has_field(leaf) {
            return Err(GridError::Configuration(format!(
                "Cannot resolve '{path}': entity '{}' has no field '{leaf}'",
                entity.name
            )));
        }
        self.projections.add(&alias, leaf);
        Ok((alias, leaf.to_string()))
    }

    pub fn finish(self) -> (ProjectionSet, JoinRegistry) {
        (self.projections, self.joins)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    /// `parentAlias.association` for joins, `None` for FROM entities.
    pub parent: Option<String>,
    pub entity: String,
}

/// Aliases of a built query, read back from its FROM and JOIN parts so that
/// custom query processors are covered as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    root: String,
    entries: HashMap<String, AliasEntry>,
}

impl AliasTable {
    pub fn from_query(
        qb: &QueryBuilder,
        metadata: &dyn MetadataProvider,
    ) -> Result<Self, GridError> {
        let root = qb.root().ok_or_else(|| {
            GridError::Configuration("Query has no root entity to alias".to_string())
        })?;

        let mut entries = HashMap::new();
        for from in qb.from_entities() {
            let meta = metadata.metadata_for(&from.entity)?;
            entries.insert(
                from.alias.clone(),
                AliasEntry {
                    parent: None,
                    entity: meta.name.clone(),
                },
            );
        }

        for join in qb.joins() {
            let (origin, association) = join.parts().ok_or_else(|| {
                GridError::Configuration(format!(
                    "Join '{}' must consist of an alias and an association",
                    join.path
                ))
            })?;
            let origin_entity = entries
                .get(origin)
                .map(|e: &AliasEntry| e.entity.clone())
                .ok_or_else(|| {
                    GridError::Configuration(format!(
                        "Join '{}' starts from unknown alias '{origin}'",
                        join.path
                    ))
                })?;
            let mapping = metadata
                .metadata_for(&origin_entity)?
                .association_or_err(association)?;
            let target = metadata.metadata_for(&mapping.target_entity)?;
            entries.insert(
                join.alias.clone(),
                AliasEntry {
                    parent: Some(join.path.clone()),
                    entity: target.name.clone(),
                },
            );
        }

        debug!(root = %root.alias, aliases = entries.len(), "Built alias table");
        Ok(Self {
            root: root.alias.clone(),
            entries,
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn get(&self, alias: &str) -> Option<&AliasEntry> {
        self.entries.get(alias)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The alias joined through `parentAlias.association`, if any.
    pub fn child(&self, parent: &str, association: &str) -> Option<&str> {
        let key = format!("{parent}.{association}");
        self.entries
            .iter()
            .find(|(_, e)| e.parent.as_deref() == Some(key.as_str()))
            .map(|(alias, _)| alias.as_str())
    }

    /// Aliases joined directly onto `parent`, as `(association, alias)`.
    pub fn children(&self, parent: &str) -> Vec<(&str, &str)> {
        let mut children: Vec<(&str, &str)> = self
            .entries
            .iter()
            .filter_map(|(alias, e)| {
                let (origin, association) = e.parent.as_deref()?.split_once('.')?;
                (origin == parent).then_some((association, alias.as_str()))
            })
            .collect();
        children.sort_unstable();
        children
    }

    /// Declared type of a qualified `alias.field`, if it is a scalar.
    pub fn field_type(&self, qualified: &str, metadata: &dyn MetadataProvider) -> Option<FieldType> {
        let (alias, field) = qualified.split_once('.')?;
        let entry = self.entries.get(alias)?;
        metadata
            .metadata_for(&entry.entity)
            .ok()?
            .field(field)
            .map(|mapping| mapping.field_type)
    }

    /// Turns a column field into `alias.field` using only joins the query
    /// already has. Accepts paths starting at any known alias as well as
    /// paths relative to the root.
    pub fn qualify(&self, path: &str, metadata: &dyn MetadataProvider) -> Result<String, GridError> {
        let segments: Vec<&str> = path.split('.').collect();
        let (mut alias, rest) = match segments.as_slice() {
            [first, rest @ ..] if !rest.is_empty() && self.entries.contains_key(*first) => {
                (first.to_string(), rest)
            }
            all => (self.root.clone(), all),
        };
        let Some((leaf, associations)) = rest.split_last() else {
            return Err(GridError::Configuration(format!("Field path '{path}' is empty")));
        };

        for segment in associations {
            alias = self
                .child(&alias, segment)
                .ok_or_else(|| {
                    GridError::Configuration(format!(
                        "Field '{path}' needs a join on '{alias}.{segment}' that the query does not contain"
                    ))
                })?
                .to_string();
        }

        let entity = self
            .entries
            .get(&alias)
            .map(|e| e.entity.as_str())
            .unwrap_or_default();
        let meta = metadata.metadata_for(entity)?;
        let is_to_one = meta
            .association(leaf)
            .is_some_and(|a| !a.kind.is_to_many());
        if !meta.has_field(leaf) && !is_to_one {
            return Err(GridError::Configuration(format!(
                "Field '{path}' does not resolve: entity '{}' has no field '{leaf}'",
                meta.name
            )));
        }
        Ok(format!("{alias}.{leaf}"))
    }
}
