use crate::error::GridError;
use query::ast::common::OrderDir;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};

/// Client-side grid options. Serialized verbatim into the initial response,
/// so field names follow the widget's option names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct GridOptions {
    #[serde(rename = "jQueryUI")]
    pub jquery_ui: bool,
    pub paging_type: String,
    pub length_menu: Vec<Vec<JsonValue>>,
    pub page_length: i64,
    pub display_start: u64,
    pub server_side: bool,
    pub processing: bool,
    pub paging: bool,
    pub length_change: bool,
    pub ordering: bool,
    pub searching: bool,
    pub search: Option<String>,
    pub auto_width: bool,
    /// Initial ordering as `(non-hidden column index, direction)` pairs.
    pub order: Vec<(usize, OrderDir)>,
    pub search_delay: u64,
    pub dom: String,
    pub order_cells_top: bool,
    pub state_save: bool,
    pub fixed_header: bool,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            jquery_ui: false,
            paging_type: "full_numbers".to_string(),
            length_menu: vec![
                vec![json!(10), json!(25), json!(50), json!(-1)],
                vec![json!(10), json!(25), json!(50), json!("All")],
            ],
            page_length: 10,
            display_start: 0,
            server_side: true,
            processing: true,
            paging: true,
            length_change: true,
            ordering: true,
            searching: false,
            search: None,
            auto_width: false,
            order: Vec::new(),
            search_delay: 400,
            dom: "lftrip".to_string(),
            order_cells_top: true,
            state_save: false,
            fixed_header: false,
        }
    }
}

impl GridOptions {
    /// Builds options from a JSON object, rejecting unknown option names.
    pub fn from_map(options: Map<String, JsonValue>) -> Result<Self, GridError> {
        serde_json::from_value(JsonValue::Object(options))
            .map_err(|e| GridError::Configuration(format!("Invalid grid options: {e}")))
    }

    /// Applies `overrides` on top of `base`, key by key.
    pub fn merged(
        base: &Map<String, JsonValue>,
        overrides: &Map<String, JsonValue>,
    ) -> Result<Self, GridError> {
        let mut merged = base.clone();
        merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self::from_map(merged)
    }

    pub fn to_json(&self) -> Map<String, JsonValue> {
        match serde_json::to_value(self) {
            Ok(JsonValue::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_serialize_with_widget_names() {
        let json = GridOptions::default().to_json();
        assert_eq!(json["jQueryUI"], json!(false));
        assert_eq!(json["pagingType"], json!("full_numbers"));
        assert_eq!(json["lengthMenu"], json!([[10, 25, 50, -1], [10, 25, 50, "All"]]));
        assert_eq!(json["pageLength"], json!(10));
        assert_eq!(json["search"], json!(null));
        assert_eq!(json["order"], json!([]));
        assert_eq!(json["searchDelay"], json!(400));
        assert_eq!(json["dom"], json!("lftrip"));
    }

    #[test]
    fn test_merge_overrides() {
        let base = json!({"pageLength": 25, "searching": true});
        let overrides = json!({"pageLength": 50, "order": [[1, "desc"]]});
        let options = GridOptions::merged(
            base.as_object().unwrap(),
            overrides.as_object().unwrap(),
        )
        .unwrap();
        assert_eq!(options.page_length, 50);
        assert!(options.searching);
        assert_eq!(options.order, vec![(1, OrderDir::Desc)]);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let bad = json!({"pageLenght": 5});
        assert!(matches!(
            GridOptions::from_map(bad.as_object().unwrap().clone()),
            Err(GridError::Configuration(_))
        ));
    }
}
