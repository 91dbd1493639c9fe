//! Wire shapes sent to the grid widget.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Answer to a draw request. The initial part is only present on the first
/// draw of a page (or in [`crate::table::DataTable::config`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridResponse {
    pub draw: u64,
    pub records_total: u64,
    pub records_filtered: u64,
    pub data: Vec<Map<String, JsonValue>>,
    #[serde(flatten)]
    pub initial: Option<InitialResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialResponse {
    /// Grid options plus a `columns` array of [`ColumnDescriptor`]s.
    pub options: Map<String, JsonValue>,
    pub template: String,
    #[serde(flatten)]
    pub editor: Option<EditorSetup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSetup {
    pub editor_options: EditorOptions,
    pub editor_buttons: Vec<String>,
    pub grouping_enabled: bool,
    #[serde(flatten)]
    pub grouping: Option<GroupingSetup>,
    pub reordering_enabled: bool,
    #[serde(flatten)]
    pub reordering: Option<ReorderingSetup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorOptions {
    pub fields: Vec<EditorField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingSetup {
    pub grouping_column: Option<String>,
    pub group_creation_field: Option<String>,
    pub group_creation_ids: Option<Vec<JsonValue>>,
    pub child_row_columns: Option<Vec<String>>,
    pub grouping_constraint_field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderingSetup {
    pub reordering_constraint_field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub data: String,
    pub orderable: bool,
    pub searchable: bool,
    pub visible: bool,
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url_prefix: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
}

/// One input of the editor dialog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorField {
    pub label: String,
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drag_drop_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_file_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attr: Option<Map<String, JsonValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub def: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_response_shape() {
        let response = GridResponse {
            draw: 3,
            records_total: 10,
            records_filtered: 2,
            data: vec![],
            initial: None,
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"draw": 3, "recordsTotal": 10, "recordsFiltered": 2, "data": []})
        );
    }

    #[test]
    fn test_initial_response_flattens_editor_setup() {
        let response = GridResponse {
            draw: 1,
            records_total: 0,
            records_filtered: 0,
            data: vec![],
            initial: Some(InitialResponse {
                options: Map::new(),
                template: String::new(),
                editor: Some(EditorSetup {
                    editor_options: EditorOptions { fields: vec![] },
                    editor_buttons: vec!["create".into()],
                    grouping_enabled: false,
                    grouping: None,
                    reordering_enabled: true,
                    reordering: Some(ReorderingSetup {
                        reordering_constraint_field: Some("list".into()),
                    }),
                }),
            }),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["editorOptions"], json!({"fields": []}));
        assert_eq!(json["editorButtons"], json!(["create"]));
        assert_eq!(json["groupingEnabled"], json!(false));
        assert!(json.get("groupingColumn").is_none());
        assert_eq!(json["reorderingConstraintField"], json!("list"));
    }
}
