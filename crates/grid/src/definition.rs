//! Declarative table definitions, loaded from JSON.

use crate::{
    adapter::{AdapterOptions, EntityAdapter, HydrationMode},
    backend::QueryExecutor,
    column::{ColumnOptions, kind::ColumnKind},
    error::GridError,
    factory::{GridFactory, TableType},
    options::GridOptions,
    table::{DataTable, EditorSettings},
};
use model::metadata::MetadataProvider;
use query::ast::common::OrderDir;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use std::{fs, path::Path, sync::Arc};
use tracing::debug;

/// A table described as data. Cell callbacks and data handlers cannot be
/// expressed here and have to be attached in code.
///
/// ```json
/// {
///   "name": "books",
///   "entity": "Book",
///   "columns": [
///     {"name": "id", "kind": "text", "hidden": true},
///     {"name": "author", "kind": "text", "field": "author.name", "filter": {}}
///   ],
///   "order": [{"column": "author", "dir": "asc"}]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition {
    pub name: String,
    pub entity: String,
    #[serde(default)]
    pub hydrate: HydrationMode,
    #[serde(default)]
    pub options: Map<String, JsonValue>,
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub order: Vec<OrderDefinition>,
    #[serde(default)]
    pub editor: Option<EditorSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(flatten)]
    pub kind: ColumnKind,
    #[serde(flatten)]
    pub options: ColumnOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderDefinition {
    pub column: String,
    #[serde(default)]
    pub dir: Option<OrderDir>,
}

impl TableDefinition {
    pub fn from_json(json: &str) -> Result<Self, GridError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GridError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            GridError::Configuration(format!("Cannot read table definition {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn adapter(
        &self,
        metadata: Arc<dyn MetadataProvider>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Result<EntityAdapter, GridError> {
        EntityAdapter::new(
            metadata,
            executor,
            AdapterOptions::new(&self.entity).hydrate(self.hydrate),
        )
    }

    /// Creates the table through `factory`, configures it and attaches an
    /// entity adapter.
    pub fn build(
        &self,
        factory: &GridFactory,
        metadata: Arc<dyn MetadataProvider>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Result<DataTable, GridError> {
        let mut table = factory.create(&self.name, &self.options)?;
        self.configure(&mut table, &JsonValue::Null)?;
        table.set_adapter(Box::new(self.adapter(metadata, executor)?))?;
        debug!(
            table = %self.name,
            entity = %self.entity,
            columns = self.columns.len(),
            "Built table from definition"
        );
        Ok(table)
    }
}

impl TableType for TableDefinition {
    /// `options` may carry grid option overrides under `"options"`.
    fn configure(&self, table: &mut DataTable, options: &JsonValue) -> Result<(), GridError> {
        if let Some(overrides) = options.get("options").and_then(JsonValue::as_object) {
            let merged = GridOptions::merged(&table.options().to_json(), overrides)?;
            table.set_options(merged);
        }

        for column in &self.columns {
            table.add(&column.name, column.kind.clone(), column.options.clone())?;
        }
        for order in &self.order {
            table.add_order_by(&order.column, order.dir.unwrap_or(OrderDir::Asc))?;
        }

        if let Some(editor) = &self.editor {
            let entity_type = editor.entity_type.clone().unwrap_or_else(|| self.entity.clone());
            *table.editor_mut() = EditorSettings {
                enabled: true,
                entity_type: Some(entity_type),
                ..editor.clone()
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BOOKS: &str = r#"{
        "name": "books",
        "entity": "Book",
        "options": {"pageLength": 25},
        "columns": [
            {"name": "id", "kind": "text", "hidden": true},
            {"name": "title", "kind": "text", "maxLength": 120, "filter": {}, "required": true},
            {"name": "author", "kind": "text", "field": "author.name", "filter": {"operator": "="}},
            {"name": "published", "kind": "datetime", "format": "%d.%m.%Y", "editable": false},
            {"name": "state", "kind": "map", "map": {"a": "Available", "l": "Lent"}, "type": "radio"}
        ],
        "order": [{"column": "title", "dir": "desc"}, {"column": "author"}],
        "editor": {"buttons": ["create", "edit", "remove"]}
    }"#;

    #[test]
    fn test_parse_definition() {
        let definition = TableDefinition::from_json(BOOKS).unwrap();
        assert_eq!(definition.columns.len(), 5);
        assert_eq!(definition.hydrate, HydrationMode::Object);

        let title = &definition.columns[1];
        assert_eq!(title.kind.max_length(), Some(120));
        assert!(title.options.required);
        assert!(title.options.filter.is_some());

        let state = &definition.columns[4];
        assert_eq!(state.kind.name(), "map");
        assert_eq!(state.options.input_type.as_deref(), Some("radio"));
    }

    #[test]
    fn test_configure_table() {
        let definition = TableDefinition::from_json(BOOKS).unwrap();
        let factory = GridFactory::default();
        let mut table = factory.create(&definition.name, &definition.options).unwrap();
        definition
            .configure(&mut table, &json!({"options": {"searching": true}}))
            .unwrap();

        assert_eq!(table.options().page_length, 25);
        assert!(table.options().searching);
        assert_eq!(table.options().order, vec![(0, OrderDir::Desc), (1, OrderDir::Asc)]);
        assert_eq!(table.column(1).unwrap().field(), Some("author.name"));
        assert!(table.editor().enabled);
        assert_eq!(table.editor().entity_type.as_deref(), Some("Book"));
        assert!(table.editor().has_button("remove"));
    }

    #[test]
    fn test_unknown_order_column() {
        let mut definition = TableDefinition::from_json(BOOKS).unwrap();
        definition.order.push(OrderDefinition {
            column: "isbn".to_string(),
            dir: None,
        });
        let mut table = DataTable::new("books");
        assert!(matches!(
            definition.configure(&mut table, &JsonValue::Null),
            Err(GridError::InvalidArgument(_))
        ));
    }
}
