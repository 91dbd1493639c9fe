//! Turns flat result rows labelled `alias.field` into nested JSON rows.
//!
//! Rows sharing a root identifier collapse into one. Each joined alias
//! becomes a property named after its association: an object (or null) for
//! to-one associations, an array deduplicated by identifier for to-many ones.

use super::alias::AliasTable;
use crate::error::GridError;
use model::{metadata::MetadataProvider, records::row::RowData};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

struct Node {
    identifier: String,
    /// `(association, alias, to_many)`
    children: Vec<(String, String, bool)>,
}

pub struct Hydrator {
    root: String,
    nodes: HashMap<String, Node>,
}

impl Hydrator {
    pub fn new(aliases: &AliasTable, metadata: &dyn MetadataProvider) -> Result<Self, GridError> {
        let mut nodes = HashMap::new();
        let mut pending = vec![aliases.root().to_string()];
        while let Some(alias) = pending.pop() {
            if nodes.contains_key(&alias) {
                continue;
            }
            let Some(entry) = aliases.get(&alias) else {
                continue;
            };
            let meta = metadata.metadata_for(&entry.entity)?;
            let mut children = Vec::new();
            for (association, child) in aliases.children(&alias) {
                let to_many = meta.association_or_err(association)?.kind.is_to_many();
                children.push((association.to_string(), child.to_string(), to_many));
                pending.push(child.to_string());
            }
            nodes.insert(
                alias,
                Node {
                    identifier: meta.identifier_field()?.to_string(),
                    children,
                },
            );
        }

        Ok(Self {
            root: aliases.root().to_string(),
            nodes,
        })
    }

    pub fn hydrate(&self, rows: Vec<RowData>) -> Vec<JsonValue> {
        let mut records: Vec<Map<String, JsonValue>> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for row in rows {
            let fields = group_by_alias(&row);
            let id_label = self
                .nodes
                .get(&self.root)
                .map(|n| format!("{}.{}", self.root, n.identifier));
            let root_id = id_label
                .and_then(|label| row.get(&label).map(|f| f.value.to_json()))
                .filter(|id| !id.is_null())
                .map(|id| id.to_string());

            match root_id.as_ref().and_then(|id| seen.get(id)) {
                Some(&index) => self.merge(&mut records[index], &self.root, &fields),
                None => {
                    let record = self.build(&self.root, &fields).unwrap_or_default();
                    if let Some(id) = root_id {
                        seen.insert(id, records.len());
                    }
                    records.push(record);
                }
            }
        }

        records.into_iter().map(JsonValue::Object).collect()
    }

    /// Builds the object for `alias`, or `None` when the row carries no
    /// entity for it (all-null outer join).
    fn build(&self, alias: &str, fields: &AliasFields) -> Option<Map<String, JsonValue>> {
        let node = self.nodes.get(alias)?;
        let own = fields.get(alias);
        let present = match own.and_then(|f| f.get(&node.identifier)) {
            Some(id) => !id.is_null(),
            None => own.is_some_and(|f| f.values().any(|v| !v.is_null())) || alias == self.root,
        };
        if !present {
            return None;
        }

        let mut object = own.cloned().unwrap_or_default();
        for (association, child, to_many) in &node.children {
            let value = self.build(child, fields);
            let value = match (to_many, value) {
                (true, Some(child)) => JsonValue::Array(vec![JsonValue::Object(child)]),
                (true, None) => JsonValue::Array(Vec::new()),
                (false, Some(child)) => JsonValue::Object(child),
                (false, None) => JsonValue::Null,
            };
            object.insert(association.clone(), value);
        }
        Some(object)
    }

    fn merge(&self, target: &mut Map<String, JsonValue>, alias: &str, fields: &AliasFields) {
        let Some(node) = self.nodes.get(alias) else {
            return;
        };
        for (association, child, to_many) in &node.children {
            let Some(incoming) = self.build(child, fields) else {
                continue;
            };
            let identifier = self.nodes.get(child.as_str()).map(|n| n.identifier.as_str());
            let slot = target
                .entry(association.clone())
                .or_insert(if *to_many {
                    JsonValue::Array(Vec::new())
                } else {
                    JsonValue::Null
                });

            match slot {
                JsonValue::Array(items) => {
                    let id = identifier.and_then(|key| incoming.get(key)).cloned();
                    let existing = items.iter_mut().find(|item| {
                        id.as_ref()
                            .is_some_and(|id| identifier.and_then(|key| item.get(key)) == Some(id))
                    });
                    match existing {
                        Some(JsonValue::Object(existing)) => self.merge(existing, child, fields),
                        _ => items.push(JsonValue::Object(incoming)),
                    }
                }
                JsonValue::Object(existing) => self.merge(existing, child, fields),
                other => *other = JsonValue::Object(incoming),
            }
        }
    }
}

type AliasFields = HashMap<String, Map<String, JsonValue>>;

fn group_by_alias(row: &RowData) -> AliasFields {
    let mut grouped: AliasFields = HashMap::new();
    for field in &row.field_values {
        if let Some((alias, name)) = field.name.split_once('.') {
            grouped
                .entry(alias.to_string())
                .or_default()
                .insert(name.to_string(), field.value.to_json());
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        core::{data_type::FieldType, value::Value},
        metadata::{
            entity::{AssociationMapping, EntityMetadata, FieldMapping},
            registry::MetadataRegistry,
        },
    };
    use query::builder::query::QueryBuilder;
    use serde_json::json;

    fn registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with(
                EntityMetadata::new("Book", "book", "id")
                    .with_field(FieldMapping::new("id", FieldType::Integer))
                    .with_field(FieldMapping::new("title", FieldType::String))
                    .with_association(AssociationMapping::many_to_one(
                        "author", "Author", "author_id", "id",
                    ))
                    .with_association(AssociationMapping::one_to_many(
                        "tags", "Tag", "id", "book_id",
                    )),
            )
            .with(
                EntityMetadata::new("Author", "author", "id")
                    .with_field(FieldMapping::new("id", FieldType::Integer))
                    .with_field(FieldMapping::new("name", FieldType::String)),
            )
            .with(
                EntityMetadata::new("Tag", "tag", "id")
                    .with_field(FieldMapping::new("id", FieldType::Integer))
                    .with_field(FieldMapping::new("label", FieldType::String)),
            )
    }

    fn hydrator(registry: &MetadataRegistry) -> Hydrator {
        let mut qb = QueryBuilder::new();
        qb.from("Book", "_book")
            .left_join("_book.author", "author")
            .left_join("_book.tags", "tags");
        let aliases = AliasTable::from_query(&qb, registry).unwrap();
        Hydrator::new(&aliases, registry).unwrap()
    }

    fn row(book: i64, author: Option<(i64, &str)>, tag: Option<(i64, &str)>) -> RowData {
        let (author_id, author_name) = match author {
            Some((id, name)) => (Value::Int(id), Value::from(name)),
            None => (Value::Null, Value::Null),
        };
        let (tag_id, tag_label) = match tag {
            Some((id, label)) => (Value::Int(id), Value::from(label)),
            None => (Value::Null, Value::Null),
        };
        RowData::from_pairs([
            ("_book.id", Value::Int(book)),
            ("_book.title", Value::from(format!("Book {book}"))),
            ("author.id", author_id),
            ("author.name", author_name),
            ("tags.id", tag_id),
            ("tags.label", tag_label),
        ])
    }

    #[test]
    fn test_rows_collapse_on_root_identifier() {
        let registry = registry();
        let rows = hydrator(&registry).hydrate(vec![
            row(1, Some((7, "Le Guin")), Some((1, "sf"))),
            row(1, Some((7, "Le Guin")), Some((2, "classic"))),
            row(1, Some((7, "Le Guin")), Some((2, "classic"))),
            row(2, None, None),
        ]);

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            json!({
                "id": 1,
                "title": "Book 1",
                "author": {"id": 7, "name": "Le Guin"},
                "tags": [{"id": 1, "label": "sf"}, {"id": 2, "label": "classic"}]
            })
        );
        assert_eq!(
            rows[1],
            json!({"id": 2, "title": "Book 2", "author": null, "tags": []})
        );
    }
}
