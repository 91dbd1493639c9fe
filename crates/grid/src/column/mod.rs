//! The column model: one displayed and possibly editable field of a table.

pub mod filter;
pub mod kind;

use crate::{editor_state::UploadedFile, error::GridError};
use filter::Filter;
use kind::ColumnKind;
use model::core::value::Value;
use query::builder::predicate::Operator;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use std::{fmt, sync::Arc};

/// Computes a cell from the hydrated row and the raw value read for the column.
pub type CellFn = Arc<dyn Fn(&JsonValue, JsonValue) -> JsonValue + Send + Sync>;

/// Rewrites one submitted editor value, given the whole submitted row.
pub type DataHandler = Arc<dyn Fn(&Map<String, JsonValue>, JsonValue) -> JsonValue + Send + Sync>;

/// Handles an uploaded file and returns the editor's upload response.
pub type UploadHandler = Arc<dyn Fn(&UploadedFile) -> JsonValue + Send + Sync>;

/// Source of a cell value when the row itself has none.
#[derive(Clone)]
pub enum CellData {
    /// Used whenever the mapped value is null.
    Static(JsonValue),
    /// Always invoked with the hydrated row and the mapped value.
    Computed(CellFn),
}

impl CellData {
    pub fn computed(f: impl Fn(&JsonValue, JsonValue) -> JsonValue + Send + Sync + 'static) -> Self {
        CellData::Computed(Arc::new(f))
    }
}

impl fmt::Debug for CellData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellData::Static(value) => f.debug_tuple("Static").field(value).finish(),
            CellData::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Options shared by every column kind. Unset tri-state options fall back to
/// the defaults documented on the accessors of [`Column`].
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnOptions {
    pub label: Option<String>,
    #[serde(skip)]
    pub data: Option<CellData>,
    /// Dotted field path, e.g. `author.name` or `_book.title`.
    pub field: Option<String>,
    /// Explicit path into the hydrated row, bypassing field mapping.
    pub property_path: Option<String>,
    pub visible: bool,
    pub orderable: Option<bool>,
    pub order_field: Option<String>,
    pub searchable: Option<bool>,
    pub global_searchable: Option<bool>,
    pub filter: Option<Filter>,
    pub class_name: Option<String>,
    pub editable: bool,
    pub inline_editable: bool,
    pub file: bool,
    pub file_many: bool,
    #[serde(skip)]
    pub upload_handler: Option<UploadHandler>,
    #[serde(skip)]
    pub data_handler: Option<DataHandler>,
    pub hidden: bool,
    pub hidden_input: bool,
    pub hidden_in_dialog: bool,
    /// Editor input type override.
    #[serde(rename = "type")]
    pub input_type: Option<String>,
    pub default_value: Option<JsonValue>,
    /// Editor input options.
    pub options: Option<JsonValue>,
    pub required: bool,
    pub comparable: bool,
    pub image_url_prefix: Option<String>,
}

impl Default for ColumnOptions {
    fn default() -> Self {
        Self {
            label: None,
            data: None,
            field: None,
            property_path: None,
            visible: true,
            orderable: None,
            order_field: None,
            searchable: None,
            global_searchable: None,
            filter: None,
            class_name: None,
            editable: true,
            inline_editable: true,
            file: false,
            file_many: false,
            upload_handler: None,
            data_handler: None,
            hidden: false,
            hidden_input: false,
            hidden_in_dialog: false,
            input_type: None,
            default_value: None,
            options: None,
            required: false,
            comparable: true,
            image_url_prefix: None,
        }
    }
}

impl fmt::Debug for ColumnOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnOptions")
            .field("field", &self.field)
            .field("order_field", &self.order_field)
            .field("searchable", &self.searchable)
            .field("orderable", &self.orderable)
            .field("filter", &self.filter)
            .field("hidden", &self.hidden)
            .field("editable", &self.editable)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

impl ColumnOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn order_field(mut self, field: &str) -> Self {
        self.order_field = Some(field.to_string());
        self
    }

    pub fn property_path(mut self, path: &str) -> Self {
        self.property_path = Some(path.to_string());
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = Some(searchable);
        self
    }

    pub fn orderable(mut self, orderable: bool) -> Self {
        self.orderable = Some(orderable);
        self
    }

    pub fn global_searchable(mut self, global: bool) -> Self {
        self.global_searchable = Some(global);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn class_name(mut self, class_name: &str) -> Self {
        self.class_name = Some(class_name.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn invisible(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn data(mut self, data: CellData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn data_handler(
        mut self,
        handler: impl Fn(&Map<String, JsonValue>, JsonValue) -> JsonValue + Send + Sync + 'static,
    ) -> Self {
        self.data_handler = Some(Arc::new(handler));
        self
    }

    pub fn upload_handler(
        mut self,
        handler: impl Fn(&UploadedFile) -> JsonValue + Send + Sync + 'static,
    ) -> Self {
        self.upload_handler = Some(Arc::new(handler));
        self
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    index: usize,
    table_name: String,
    kind: ColumnKind,
    options: ColumnOptions,
}

impl Column {
    /// Resolves a column once at registration. `index` is the position among
    /// the table's non-hidden columns at the time it is added.
    pub fn new(
        name: &str,
        index: usize,
        table_name: &str,
        kind: ColumnKind,
        options: ColumnOptions,
    ) -> Result<Self, GridError> {
        if name.is_empty() {
            return Err(GridError::Configuration(
                "Column name cannot be empty".to_string(),
            ));
        }
        kind.validate()?;
        Ok(Self {
            name: name.to_string(),
            index,
            table_name: table_name.to_string(),
            kind,
            options,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    pub fn options(&self) -> &ColumnOptions {
        &self.options
    }

    /// Defaults to `{table}.columns.{name}`.
    pub fn label(&self) -> String {
        self.options
            .label
            .clone()
            .unwrap_or_else(|| format!("{}.columns.{}", self.table_name, self.name))
    }

    pub fn field(&self) -> Option<&str> {
        self.options.field.as_deref().filter(|f| !f.is_empty())
    }

    pub fn set_field(&mut self, field: String) {
        self.options.field = Some(field);
    }

    pub fn property_path(&self) -> Option<&str> {
        self.options.property_path.as_deref()
    }

    /// Defaults to the field.
    pub fn order_field(&self) -> Option<&str> {
        self.options
            .order_field
            .as_deref()
            .filter(|f| !f.is_empty())
            .or_else(|| self.field())
    }

    /// Defaults to whether a field is present.
    pub fn is_searchable(&self) -> bool {
        self.options.searchable.unwrap_or(self.field().is_some())
    }

    /// Defaults to whether an order field is present.
    pub fn is_orderable(&self) -> bool {
        self.options.orderable.unwrap_or(self.order_field().is_some())
    }

    /// Defaults to searchability.
    pub fn is_global_searchable(&self) -> bool {
        self.options
            .global_searchable
            .unwrap_or_else(|| self.is_searchable())
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.options.filter.as_ref()
    }

    /// Operator of the configured filter, falling back to the kind default.
    pub fn operator(&self) -> Option<Operator> {
        self.filter()
            .map(|f| f.operator.unwrap_or_else(|| self.kind.default_operator()))
    }

    pub fn class_name(&self) -> Option<&str> {
        self.options.class_name.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.options.visible
    }

    pub fn is_hidden(&self) -> bool {
        self.options.hidden
    }

    pub fn is_hidden_input(&self) -> bool {
        self.options.hidden_input
    }

    pub fn is_hidden_in_dialog(&self) -> bool {
        self.options.hidden_in_dialog
    }

    pub fn is_editable(&self) -> bool {
        self.options.editable
    }

    pub fn is_inline_editable(&self) -> bool {
        self.options.inline_editable
    }

    pub fn is_file(&self) -> bool {
        self.options.file
    }

    pub fn is_file_many(&self) -> bool {
        self.options.file_many
    }

    pub fn is_required(&self) -> bool {
        self.options.required
    }

    pub fn is_comparable(&self) -> bool {
        self.options.comparable
    }

    pub fn image_url_prefix(&self) -> Option<&str> {
        self.options.image_url_prefix.as_deref()
    }

    pub fn input_type(&self) -> Option<&str> {
        self.options.input_type.as_deref()
    }

    pub fn default_value(&self) -> Option<&JsonValue> {
        self.options.default_value.as_ref()
    }

    pub fn field_options(&self) -> Option<&JsonValue> {
        self.options.options.as_ref()
    }

    pub fn data_handler(&self) -> Option<&DataHandler> {
        self.options.data_handler.as_ref()
    }

    pub fn upload_handler(&self) -> Option<&UploadHandler> {
        self.options.upload_handler.as_ref()
    }

    pub fn is_valid_for_search(&self, term: &str) -> bool {
        self.kind.is_valid_for_search(term)
    }

    pub fn search_value(&self, term: &str) -> Value {
        self.kind.search_value(term)
    }

    /// Turns the value read from a hydrated row into the cell sent to the grid.
    pub fn transform(&self, value: JsonValue, row: &JsonValue) -> JsonValue {
        let value = match &self.options.data {
            Some(CellData::Computed(f)) => f(row, value),
            Some(CellData::Static(default)) if value.is_null() => default.clone(),
            _ => value,
        };
        self.kind.normalize(&value)
    }
}
