//! The data table: columns, options, request handling and responses.

use crate::{
    adapter::{Adapter, DataRequest, RowTransformer},
    column::{Column, ColumnOptions, kind::ColumnKind},
    editor_state::{EditorState, UploadedFile},
    error::GridError,
    options::GridOptions,
    response::{
        ColumnDescriptor, EditorField, EditorOptions, EditorSetup, GridResponse, GroupingSetup,
        InitialResponse, ReorderingSetup,
    },
    state::GridState,
    translate::{EmptyRenderer, KeyTranslator, TemplateRenderer, Translator},
};
use query::ast::common::OrderDir;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue, json};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, warn};

pub const DEFAULT_NAME: &str = "dt";
pub const DEFAULT_TEMPLATE: &str = "datatable_html.html";

const UPLOAD_TEXT_KEY: &str = "datatable.editor.fileUpload.uploadText";
const DRAG_DROP_TEXT_KEY: &str = "datatable.editor.fileUpload.dragDropText";
const NO_FILE_TEXT_KEY: &str = "datatable.editor.fileUpload.noFileText";

/// Editor configuration of a table. The editor itself lives in its own
/// crate and reads these settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorSettings {
    pub enabled: bool,
    pub entity_type: Option<String>,
    pub buttons: Vec<String>,
    pub allow_inline_editing: bool,
    pub grouping_column: Option<String>,
    pub child_row_columns: Option<Vec<String>>,
    pub group_creation_field: Option<String>,
    pub group_creation_ids: Option<Vec<JsonValue>>,
    pub grouping_constraint_field: Option<String>,
    pub reordering_enabled: bool,
    pub reordering_constraint_field: Option<String>,
    pub validation_group: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            entity_type: None,
            buttons: Vec::new(),
            allow_inline_editing: true,
            grouping_column: None,
            child_row_columns: None,
            group_creation_field: None,
            group_creation_ids: None,
            grouping_constraint_field: None,
            reordering_enabled: false,
            reordering_constraint_field: None,
            validation_group: "Default".to_string(),
        }
    }
}

impl EditorSettings {
    pub fn grouping_enabled(&self) -> bool {
        self.grouping_column.is_some()
    }

    pub fn has_button(&self, button: &str) -> bool {
        self.buttons.iter().any(|b| b == button)
    }
}

pub struct DataTable {
    name: String,
    options: GridOptions,
    columns: Vec<Column>,
    /// Positions in `columns` of the non-hidden columns.
    visible: Vec<usize>,
    by_name: HashMap<String, usize>,
    adapter: Option<Box<dyn Adapter>>,
    method: String,
    persist_state: String,
    translation_domain: String,
    language_from_cdn: bool,
    template: String,
    template_parameters: JsonValue,
    renderer: Arc<dyn TemplateRenderer>,
    translator: Arc<dyn Translator>,
    transformer: Option<RowTransformer>,
    state: Option<GridState>,
    editor_state: Option<EditorState>,
    editor: EditorSettings,
}

impl DataTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: if name.is_empty() { DEFAULT_NAME } else { name }.to_string(),
            options: GridOptions::default(),
            columns: Vec::new(),
            visible: Vec::new(),
            by_name: HashMap::new(),
            adapter: None,
            method: "POST".to_string(),
            persist_state: "fragment".to_string(),
            translation_domain: "messages".to_string(),
            language_from_cdn: true,
            template: DEFAULT_TEMPLATE.to_string(),
            template_parameters: JsonValue::Object(Map::new()),
            renderer: Arc::new(EmptyRenderer),
            translator: Arc::new(KeyTranslator),
            transformer: None,
            state: None,
            editor_state: None,
            editor: EditorSettings::default(),
        }
    }

    /// Registers a column. Its index is the number of non-hidden columns
    /// registered before it.
    pub fn add(
        &mut self,
        name: &str,
        kind: ColumnKind,
        options: ColumnOptions,
    ) -> Result<&mut Self, GridError> {
        if self.by_name.contains_key(name) {
            return Err(GridError::Configuration(format!(
                "There already is a column with name '{name}'"
            )));
        }

        let column = Column::new(name, self.visible.len(), &self.name, kind, options)?;
        let position = self.columns.len();
        if !column.is_hidden() {
            self.visible.push(position);
        }
        self.by_name.insert(name.to_string(), position);
        self.columns.push(column);
        Ok(self)
    }

    /// Adds to the default ordering by column name.
    pub fn add_order_by(&mut self, name: &str, direction: OrderDir) -> Result<&mut Self, GridError> {
        let index = self.column_by_name(name)?.index();
        self.options.order.push((index, direction));
        Ok(self)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Non-hidden column by index.
    pub fn column(&self, index: usize) -> Result<&Column, GridError> {
        Ok(&self.columns[self.column_position(index)?])
    }

    /// Position in [`Self::columns`] of the non-hidden column `index`.
    pub fn column_position(&self, index: usize) -> Result<usize, GridError> {
        self.visible
            .get(index)
            .copied()
            .ok_or_else(|| GridError::InvalidArgument(format!("There is no column with index {index}")))
    }

    pub fn column_by_name(&self, name: &str) -> Result<&Column, GridError> {
        self.by_name
            .get(name)
            .map(|&position| &self.columns[position])
            .ok_or_else(|| GridError::InvalidArgument(format!("There is no column named '{name}'")))
    }

    pub fn set_adapter(&mut self, adapter: Box<dyn Adapter>) -> Result<&mut Self, GridError> {
        adapter.prepare_columns(&mut self.columns)?;
        self.adapter = Some(adapter);
        Ok(self)
    }

    pub fn has_adapter(&self) -> bool {
        self.adapter.is_some()
    }

    /// Reads request parameters. A parameter `_dt` naming this table makes
    /// it a draw request; otherwise an `action` makes it an editor request.
    pub fn handle_request(
        &mut self,
        params: &JsonValue,
        upload: Option<UploadedFile>,
    ) -> Result<&mut Self, GridError> {
        let target = params.get("_dt").and_then(JsonValue::as_str);
        if target == Some(self.name.as_str()) {
            if let Some(adapter) = &self.adapter {
                adapter.prepare_columns(&mut self.columns)?;
            }
            let mut state = match self.state.take() {
                Some(state) => state,
                None => GridState::from_defaults(self)?,
            };
            state.apply_parameters(params, self)?;
            debug!(table = %self.name, draw = state.draw(), initial = state.is_initial(), "Handling draw request");
            self.state = Some(state);
        } else if self.editor_state.is_none() {
            self.editor_state = EditorState::from_params(params, upload)?;
            if let Some(state) = &self.editor_state {
                debug!(table = %self.name, action = %state.action(), "Handling editor request");
            }
        }
        Ok(self)
    }

    pub fn is_callback(&self) -> bool {
        self.state.is_some()
    }

    pub fn is_editor_callback(&self) -> bool {
        self.editor_state.is_some()
    }

    pub fn state(&self) -> Option<&GridState> {
        self.state.as_ref()
    }

    pub fn editor_state(&self) -> Option<&EditorState> {
        self.editor_state.as_ref()
    }

    pub async fn get_response(&mut self) -> Result<GridResponse, GridError> {
        let Some(state) = self.state.as_ref() else {
            return Err(GridError::InvalidState(
                "The table does not know its state yet, was handle_request called?".to_string(),
            ));
        };
        let Some(adapter) = self.adapter.as_mut() else {
            return Err(GridError::MissingDependency(
                "No adapter was configured to retrieve data with, call set_adapter first".to_string(),
            ));
        };

        adapter.prepare_columns(&mut self.columns)?;
        let result = adapter
            .get_data(DataRequest {
                state,
                columns: &self.columns,
                transformer: self.transformer.as_ref(),
            })
            .await?;

        let draw = state.draw();
        let initial = state.is_initial().then(|| self.initial_response());
        Ok(GridResponse {
            draw,
            records_total: result.total,
            records_filtered: result.filtered,
            data: result.data,
            initial,
        })
    }

    /// Initial configuration without data, for pages that load rows later.
    pub fn config(&self) -> GridResponse {
        GridResponse {
            draw: 0,
            records_total: 0,
            records_filtered: 0,
            data: Vec::new(),
            initial: Some(self.initial_response()),
        }
    }

    fn initial_response(&self) -> InitialResponse {
        InitialResponse {
            options: self.initial_options(),
            template: self
                .renderer
                .render(&self.template, &self.template_parameters),
            editor: self.editor.enabled.then(|| self.editor_setup()),
        }
    }

    fn editor_setup(&self) -> EditorSetup {
        let settings = &self.editor;
        EditorSetup {
            editor_options: EditorOptions {
                fields: self.initial_editor_fields(),
            },
            editor_buttons: settings.buttons.clone(),
            grouping_enabled: settings.grouping_enabled(),
            grouping: settings.grouping_enabled().then(|| GroupingSetup {
                grouping_column: settings.grouping_column.clone(),
                group_creation_field: settings.group_creation_field.clone(),
                group_creation_ids: settings.group_creation_ids.clone(),
                child_row_columns: settings.child_row_columns.clone(),
                grouping_constraint_field: settings.grouping_constraint_field.clone(),
            }),
            reordering_enabled: settings.reordering_enabled,
            reordering: settings.reordering_enabled.then(|| ReorderingSetup {
                reordering_constraint_field: settings.reordering_constraint_field.clone(),
            }),
        }
    }

    /// Grid options with the descriptor of every non-hidden column.
    pub fn initial_options(&self) -> Map<String, JsonValue> {
        let descriptors: Vec<ColumnDescriptor> = self
            .visible
            .iter()
            .map(|&position| self.column_descriptor(&self.columns[position]))
            .collect();

        let mut options = self.options.to_json();
        match serde_json::to_value(descriptors) {
            Ok(columns) => {
                options.insert("columns".to_string(), columns);
            }
            Err(e) => warn!(error = %e, "Could not serialize column descriptors"),
        }
        options
    }

    fn column_descriptor(&self, column: &Column) -> ColumnDescriptor {
        let mut class_name = column.class_name().map(str::to_string);
        if column.is_editable() && column.is_inline_editable() && self.editor.allow_inline_editing {
            let classes = format!("{} editable", class_name.unwrap_or_default());
            class_name = Some(classes.trim_start().to_string());
        }

        let map = column.kind().labels();
        let rendered_length = match map {
            Some(_) => None,
            None => column.kind().rendered_length(),
        };
        ColumnDescriptor {
            data: column.name().to_string(),
            orderable: column.is_orderable(),
            searchable: column.is_searchable(),
            visible: column.is_visible(),
            class_name,
            map,
            rendered_length,
            image_url_prefix: column.image_url_prefix().map(str::to_string),
            kind: column.kind().is_date().then(|| "date".to_string()),
            date_format: column.kind().date_format().map(str::to_string),
        }
    }

    /// Editor inputs for every editable column, hidden ones included.
    pub fn initial_editor_fields(&self) -> Vec<EditorField> {
        self.columns
            .iter()
            .filter(|column| column.is_editable())
            .map(|column| self.editor_field(column))
            .collect()
    }

    fn editor_field(&self, column: &Column) -> EditorField {
        let mut field = EditorField {
            label: self.trans(&column.label()),
            name: column.name().to_string(),
            ..Default::default()
        };

        let upload_kind = if column.is_file_many() {
            Some("uploadMany")
        } else if column.is_file() {
            Some("upload")
        } else {
            None
        };
        if let Some(kind) = upload_kind {
            field.kind = Some(kind.to_string());
            field.upload_text = Some(self.trans(UPLOAD_TEXT_KEY));
            field.drag_drop_text = Some(self.trans(DRAG_DROP_TEXT_KEY));
            field.no_file_text = Some(self.trans(NO_FILE_TEXT_KEY));
        }

        if let Some(map) = column.kind().normalized_map() {
            field.kind = Some("select".to_string());
            let options: Vec<JsonValue> = map
                .into_iter()
                .map(|(value, label)| json!({"label": label, "value": value}))
                .collect();
            field.options = Some(JsonValue::Array(options));
        }

        let mut attr = Map::new();
        if let Some(lines) = column.kind().lines().filter(|&l| l > 1) {
            field.kind = Some("textarea".to_string());
            attr.insert("rows".to_string(), json!(lines));
        }
        if let Some(max_length) = column.kind().max_length().filter(|&l| l > 1) {
            attr.insert("maxlength".to_string(), json!(max_length));
        }
        if !attr.is_empty() {
            field.attr = Some(attr);
        }

        if let Some(options) = column.field_options() {
            field.options = Some(options.clone());
        }
        if column.kind().is_date() {
            field.kind = Some("date".to_string());
            field.date_format = column.kind().date_format().map(str::to_string);
        }
        field.def = column.default_value().cloned();
        if let Some(kind) = column.input_type() {
            field.kind = Some(kind.to_string());
        }
        if column.is_hidden() || column.is_hidden_input() {
            field.kind = Some("hidden".to_string());
        }
        if column.is_hidden_in_dialog() {
            field.class_name = Some("hidden-input".to_string());
        }
        if !column.is_comparable() {
            field.compare = Some("function(a,b){return false;}".to_string());
        }
        field
    }

    pub fn trans(&self, key: &str) -> String {
        self.translator.trans(key, &self.translation_domain)
    }

    /// Grouped and reorderable tables show all rows at once.
    pub fn paging_enabled(&self) -> bool {
        !(self.editor.reordering_enabled || self.editor.grouping_enabled())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) -> Result<&mut Self, GridError> {
        if name.is_empty() {
            return Err(GridError::InvalidArgument(
                "Table name cannot be empty".to_string(),
            ));
        }
        self.name = name.to_string();
        Ok(self)
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut GridOptions {
        &mut self.options
    }

    pub fn set_options(&mut self, options: GridOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn set_method(&mut self, method: &str) -> &mut Self {
        self.method = method.to_uppercase();
        self
    }

    pub fn persist_state(&self) -> &str {
        &self.persist_state
    }

    pub fn set_persist_state(&mut self, persist_state: &str) -> &mut Self {
        self.persist_state = persist_state.to_string();
        self
    }

    pub fn translation_domain(&self) -> &str {
        &self.translation_domain
    }

    pub fn set_translation_domain(&mut self, domain: &str) -> &mut Self {
        self.translation_domain = domain.to_string();
        self
    }

    pub fn is_language_from_cdn(&self) -> bool {
        self.language_from_cdn
    }

    pub fn set_language_from_cdn(&mut self, from_cdn: bool) -> &mut Self {
        self.language_from_cdn = from_cdn;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn set_template(&mut self, template: &str, parameters: JsonValue) -> &mut Self {
        self.template = template.to_string();
        self.template_parameters = parameters;
        self
    }

    pub fn set_renderer(&mut self, renderer: Arc<dyn TemplateRenderer>) -> &mut Self {
        self.renderer = renderer;
        self
    }

    pub fn set_translator(&mut self, translator: Arc<dyn Translator>) -> &mut Self {
        self.translator = translator;
        self
    }

    pub fn set_transformer(
        &mut self,
        transformer: impl Fn(Map<String, JsonValue>, &JsonValue) -> Map<String, JsonValue>
        + Send
        + Sync
        + 'static,
    ) -> &mut Self {
        self.transformer = Some(Arc::new(transformer));
        self
    }

    pub fn editor(&self) -> &EditorSettings {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut EditorSettings {
        &mut self.editor
    }

    pub fn use_editor(&mut self, entity_type: &str) -> &mut Self {
        self.editor.enabled = true;
        self.editor.entity_type = Some(entity_type.to_string());
        self
    }

    pub fn set_editor_buttons<I, S>(&mut self, buttons: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.editor.buttons = buttons.into_iter().map(Into::into).collect();
        self
    }
}
