use crate::error::GridError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::{fmt, path::PathBuf, str::FromStr};

/// Submitted field values of one row, keyed by column name.
pub type FieldMap = Map<String, JsonValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorAction {
    Create,
    CreateNoValidation,
    Edit,
    EditNoValidation,
    Remove,
    Upload,
}

impl EditorAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditorAction::Create => "create",
            EditorAction::CreateNoValidation => "create_no_validation",
            EditorAction::Edit => "edit",
            EditorAction::EditNoValidation => "edit_no_validation",
            EditorAction::Remove => "remove",
            EditorAction::Upload => "upload",
        }
    }
}

impl FromStr for EditorAction {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(EditorAction::Create),
            "create_no_validation" => Ok(EditorAction::CreateNoValidation),
            "edit" => Ok(EditorAction::Edit),
            "edit_no_validation" => Ok(EditorAction::EditNoValidation),
            "remove" => Ok(EditorAction::Remove),
            "upload" => Ok(EditorAction::Upload),
            other => Err(GridError::InvalidArgument(format!(
                "Unknown editor action '{other}'"
            ))),
        }
    }
}

impl fmt::Display for EditorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file received with an editor upload request, already stored by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub size: u64,
    pub path: PathBuf,
}

/// One editor submission. Rows are keyed by row id for edits and by a
/// client-side index for creates.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    action: EditorAction,
    data: Vec<(String, FieldMap)>,
    upload_field: Option<String>,
    upload: Option<UploadedFile>,
}

impl EditorState {
    pub fn with_data(action: EditorAction, data: Vec<(String, FieldMap)>) -> Self {
        Self {
            action,
            data,
            upload_field: None,
            upload: None,
        }
    }

    pub fn with_upload(action: EditorAction, field: &str, upload: UploadedFile) -> Self {
        Self {
            action,
            data: Vec::new(),
            upload_field: Some(field.to_string()),
            upload: Some(upload),
        }
    }

    /// Reads an editor request: `action`, and either `data` (row key → field
    /// map) or an upload for `uploadField`. Returns `None` without an action.
    pub fn from_params(
        params: &JsonValue,
        upload: Option<UploadedFile>,
    ) -> Result<Option<Self>, GridError> {
        let Some(action) = params.get("action").and_then(JsonValue::as_str) else {
            return Ok(None);
        };
        let action: EditorAction = action.parse()?;

        if let Some(data) = params.get("data").filter(|d| !is_blank(d)) {
            let rows = data.as_object().ok_or_else(|| {
                GridError::InvalidArgument("Editor data must be an object keyed by row".to_string())
            })?;
            let data = rows
                .iter()
                .map(|(key, row)| match row {
                    JsonValue::Object(fields) => Ok((key.clone(), fields.clone())),
                    _ => Err(GridError::InvalidArgument(format!(
                        "Editor data for row '{key}' must be an object"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Some(Self::with_data(action, data)));
        }

        if let Some(upload) = upload {
            let field = params
                .get("uploadField")
                .and_then(JsonValue::as_str)
                .unwrap_or_default();
            return Ok(Some(Self::with_upload(action, field, upload)));
        }

        Ok(Some(Self::with_data(action, Vec::new())))
    }

    pub fn action(&self) -> EditorAction {
        self.action
    }

    pub fn data(&self) -> &[(String, FieldMap)] {
        &self.data
    }

    pub fn upload_field(&self) -> Option<&str> {
        self.upload_field.as_deref().filter(|f| !f.is_empty())
    }

    pub fn upload(&self) -> Option<&UploadedFile> {
        self.upload.as_ref()
    }
}

fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Object(map) => map.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        _ => false,
    }
}
