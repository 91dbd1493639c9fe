//! Creates tables with shared defaults and named table types.

use crate::{
    error::GridError,
    options::GridOptions,
    table::{DEFAULT_TEMPLATE, DataTable},
    translate::{EmptyRenderer, KeyTranslator, TemplateRenderer, Translator},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

/// Defaults applied to every table a [`GridFactory`] creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FactoryConfig {
    /// Grid options, validated when a table is created.
    pub options: Map<String, JsonValue>,
    pub method: String,
    pub persist_state: String,
    pub translation_domain: String,
    pub language_from_cdn: bool,
    pub template: String,
    pub template_parameters: JsonValue,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            options: Map::new(),
            method: "POST".to_string(),
            persist_state: "fragment".to_string(),
            translation_domain: "messages".to_string(),
            language_from_cdn: true,
            template: DEFAULT_TEMPLATE.to_string(),
            template_parameters: JsonValue::Object(Map::new()),
        }
    }
}

/// A reusable table layout, applied to a freshly created table.
pub trait TableType: Send + Sync {
    fn configure(&self, table: &mut DataTable, options: &JsonValue) -> Result<(), GridError>;
}

pub struct GridFactory {
    config: FactoryConfig,
    translator: Arc<dyn Translator>,
    renderer: Arc<dyn TemplateRenderer>,
    types: HashMap<String, Arc<dyn TableType>>,
}

impl GridFactory {
    pub fn new(config: FactoryConfig) -> Self {
        Self {
            config,
            translator: Arc::new(KeyTranslator),
            renderer: Arc::new(EmptyRenderer),
            types: HashMap::new(),
        }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn register_type(&mut self, name: &str, table_type: Arc<dyn TableType>) -> &mut Self {
        self.types.insert(name.to_string(), table_type);
        self
    }

    /// A new table with the configured defaults; `overrides` replace
    /// individual grid options.
    pub fn create(
        &self,
        name: &str,
        overrides: &Map<String, JsonValue>,
    ) -> Result<DataTable, GridError> {
        let mut table = DataTable::new(name);
        table
            .set_options(GridOptions::merged(&self.config.options, overrides)?)
            .set_method(&self.config.method)
            .set_persist_state(&self.config.persist_state)
            .set_translation_domain(&self.config.translation_domain)
            .set_language_from_cdn(self.config.language_from_cdn)
            .set_template(&self.config.template, self.config.template_parameters.clone())
            .set_translator(Arc::clone(&self.translator))
            .set_renderer(Arc::clone(&self.renderer));
        debug!(table = name, "Created table");
        Ok(table)
    }

    pub fn create_from_type(
        &self,
        type_name: &str,
        name: &str,
        options: &JsonValue,
    ) -> Result<DataTable, GridError> {
        let table_type = self.types.get(type_name).ok_or_else(|| {
            GridError::Configuration(format!("No table type registered as '{type_name}'"))
        })?;
        let mut table = self.create(name, &Map::new())?;
        table_type.configure(&mut table, options)?;
        Ok(table)
    }
}

impl Default for GridFactory {
    fn default() -> Self {
        Self::new(FactoryConfig::default())
    }
}
