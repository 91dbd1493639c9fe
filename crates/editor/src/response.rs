use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

pub const EMPTY_DATA: &str = "datatable.editor.error.emptyData";
pub const EMPTY_UPLOAD: &str = "datatable.editor.error.emptyUpload";
pub const FIELD_REQUIRED: &str = "datatable.editor.error.fieldRequired";
pub const INTEGER_REQUIRED: &str = "datatable.editor.error.integerRequired";
pub const ENTITY_REQUIRED: &str = "datatable.editor.error.entityRequired";
pub const ENTITY_NOT_FOUND: &str = "datatable.editor.error.entityNotFound";
pub const INVALID_VALUE: &str = "datatable.editor.error.invalidValue";
pub const ABORTED: &str = "datatable.editor.error.aborted";
pub const STORAGE_FAILED: &str = "datatable.editor.error.storage";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub name: String,
    pub status: String,
}

/// Answer to an editor request, in the editor widget's wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EditorResponse {
    /// Saved rows keyed like the submission.
    Data { data: Map<String, JsonValue> },
    FieldErrors {
        #[serde(rename = "fieldErrors")]
        field_errors: Vec<FieldError>,
    },
    Error { error: String },
    /// Passed through from a column's upload handler.
    Upload(JsonValue),
}

impl EditorResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, EditorResponse::Data { .. } | EditorResponse::Upload(_))
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}
