use serde_json::Value as JsonValue;
use std::fmt::Debug;

/// Message lookup used for labels and editor texts.
pub trait Translator: Debug + Send + Sync {
    fn trans(&self, key: &str, domain: &str) -> String;
}

/// Returns every key untranslated.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyTranslator;

impl Translator for KeyTranslator {
    fn trans(&self, key: &str, _domain: &str) -> String {
        key.to_string()
    }
}

/// Renders the HTML template shipped with the initial response.
pub trait TemplateRenderer: Debug + Send + Sync {
    fn render(&self, template: &str, parameters: &JsonValue) -> String;
}

/// Renderer for hosts that build the markup themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRenderer;

impl TemplateRenderer for EmptyRenderer {
    fn render(&self, _template: &str, _parameters: &JsonValue) -> String {
        String::new()
    }
}
