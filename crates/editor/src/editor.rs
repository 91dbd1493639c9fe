//! Create, edit, remove and upload actions of the grid editor.

use crate::{
    binding::EntityBinding,
    error::EditorError,
    hooks::{HookOutcome, Hooks, run_entity_hooks, run_remove_hooks},
    merge::{merge, project},
    response::{
        ABORTED, EMPTY_DATA, EMPTY_UPLOAD, ENTITY_NOT_FOUND, EditorResponse, FieldError,
        STORAGE_FAILED,
    },
    storage::{UnitOfWork, Validator},
};
use grid::{
    editor_state::{EditorAction, EditorState, FieldMap},
    error::{GridError, StorageError},
    table::DataTable,
};
use model::core::value::Value;
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct Editor<E> {
    binding: EntityBinding<E>,
    validator: Option<Arc<dyn Validator<E>>>,
    hooks: Hooks<E>,
}

impl<E: Send> Editor<E> {
    pub fn new(binding: EntityBinding<E>) -> Self {
        Self {
            binding,
            validator: None,
            hooks: Hooks::default(),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator<E>>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn before_create(
        mut self,
        hook: impl Fn(&DataTable, &E, &FieldMap) -> HookOutcome + Send + Sync + 'static,
    ) -> Self {
        self.hooks.before_create.push(Arc::new(hook));
        self
    }

    pub fn after_create(
        mut self,
        hook: impl Fn(&DataTable, &E, &FieldMap) -> HookOutcome + Send + Sync + 'static,
    ) -> Self {
        self.hooks.after_create.push(Arc::new(hook));
        self
    }

    pub fn before_edit(
        mut self,
        hook: impl Fn(&DataTable, &E, &FieldMap) -> HookOutcome + Send + Sync + 'static,
    ) -> Self {
        self.hooks.before_edit.push(Arc::new(hook));
        self
    }

    pub fn after_edit(
        mut self,
        hook: impl Fn(&DataTable, &E, &FieldMap) -> HookOutcome + Send + Sync + 'static,
    ) -> Self {
        self.hooks.after_edit.push(Arc::new(hook));
        self
    }

    pub fn before_remove(
        mut self,
        hook: impl Fn(&DataTable, &[Value]) -> HookOutcome + Send + Sync + 'static,
    ) -> Self {
        self.hooks.before_remove.push(Arc::new(hook));
        self
    }

    pub fn after_remove(
        mut self,
        hook: impl Fn(&DataTable, &[Value]) -> HookOutcome + Send + Sync + 'static,
    ) -> Self {
        self.hooks.after_remove.push(Arc::new(hook));
        self
    }

    pub fn binding(&self) -> &EntityBinding<E> {
        &self.binding
    }

    /// Runs the submitted action. `derived` values are assigned to every
    /// created or edited instance after the submitted ones.
    pub async fn process(
        &self,
        table: &DataTable,
        uow: &mut dyn UnitOfWork<E>,
        state: &EditorState,
        derived: &FieldMap,
    ) -> Result<EditorResponse, EditorError> {
        let settings = table.editor();
        if !settings.enabled {
            return Err(GridError::MissingDependency(format!(
                "Table '{}' has no editor configured, call use_editor first",
                table.name()
            ))
            .into());
        }
        if let Some(entity_type) = &settings.entity_type {
            if entity_type != self.binding.entity() {
                return Err(EditorError::EntityMismatch {
                    table: entity_type.clone(),
                    binding: self.binding.entity().to_string(),
                });
            }
        }

        let action = state.action();
        info!(table = table.name(), %action, rows = state.data().len(), "Processing editor action");

        let result = match action {
            EditorAction::Create => self.create(table, uow, state, derived, true).await,
            EditorAction::CreateNoValidation => self.create(table, uow, state, derived, false).await,
            EditorAction::Edit => self.edit(table, uow, state, derived, true).await,
            EditorAction::EditNoValidation => self.edit(table, uow, state, derived, false).await,
            EditorAction::Remove => self.remove(table, uow, state).await,
            EditorAction::Upload => Ok(self.upload(table, state)),
        };

        Ok(result.unwrap_or_else(|e| {
            error!(table = table.name(), %action, error = %e, "Editor action failed");
            failure(table, STORAGE_FAILED)
        }))
    }

    async fn create(
        &self,
        table: &DataTable,
        uow: &mut dyn UnitOfWork<E>,
        state: &EditorState,
        derived: &FieldMap,
        validate: bool,
    ) -> Result<EditorResponse, StorageError> {
        if state.data().is_empty() {
            return Ok(failure(table, EMPTY_DATA));
        }

        let mut created = Vec::with_capacity(state.data().len());
        for (key, row) in state.data() {
            let mut instance = self.binding.instantiate();
            let mut errors = merge(&mut instance, table, &self.binding, uow, row, derived).await;
            if validate {
                errors.extend(self.validate(&instance, table));
            }
            if !errors.is_empty() {
                return Ok(EditorResponse::FieldErrors {
                    field_errors: errors,
                });
            }
            if run_entity_hooks(&self.hooks.before_create, table, &instance, row) == HookOutcome::Abort {
                return Ok(aborted(table, "before create"));
            }
            uow.persist(&mut instance).await?;
            created.push((key, row, instance));
        }
        uow.commit().await?;

        let mut data = Map::new();
        for (key, row, instance) in &created {
            if run_entity_hooks(&self.hooks.after_create, table, instance, row) == HookOutcome::Abort {
                return Ok(aborted(table, "after create"));
            }
            data.insert(
                (*key).clone(),
                JsonValue::Object(project(instance, table, &self.binding)),
            );
        }
        info!(table = table.name(), rows = data.len(), "Created rows");
        Ok(EditorResponse::Data { data })
    }

    async fn edit(
        &self,
        table: &DataTable,
        uow: &mut dyn UnitOfWork<E>,
        state: &EditorState,
        derived: &FieldMap,
        validate: bool,
    ) -> Result<EditorResponse, StorageError> {
        if state.data().is_empty() {
            return Ok(failure(table, EMPTY_DATA));
        }

        let mut data = Map::new();
        let mut edited = Vec::with_capacity(state.data().len());
        for (id, row) in state.data() {
            let Some(mut instance) = uow.find(self.binding.entity(), id).await? else {
                warn!(table = table.name(), id = %id, "Edited row no longer exists");
                return Ok(failure(table, ENTITY_NOT_FOUND));
            };
            let mut errors = merge(&mut instance, table, &self.binding, uow, row, derived).await;
            if validate {
                errors.extend(self.validate(&instance, table));
            }
            if !errors.is_empty() {
                return Ok(EditorResponse::FieldErrors {
                    field_errors: errors,
                });
            }
            data.insert(
                id.clone(),
                JsonValue::Object(project(&instance, table, &self.binding)),
            );
            if run_entity_hooks(&self.hooks.before_edit, table, &instance, row) == HookOutcome::Abort {
                return Ok(aborted(table, "before edit"));
            }
            uow.persist(&mut instance).await?;
            edited.push((row, instance));
        }
        uow.commit().await?;

        for (row, instance) in &edited {
            if run_entity_hooks(&self.hooks.after_edit, table, instance, row) == HookOutcome::Abort {
                return Ok(aborted(table, "after edit"));
            }
        }
        info!(table = table.name(), rows = data.len(), "Edited rows");
        Ok(EditorResponse::Data { data })
    }

    async fn remove(
        &self,
        table: &DataTable,
        uow: &mut dyn UnitOfWork<E>,
        state: &EditorState,
    ) -> Result<EditorResponse, StorageError> {
        if state.data().is_empty() {
            return Ok(failure(table, EMPTY_DATA));
        }

        // Rows carry their id; the row key is the fallback.
        let ids: Vec<Value> = state
            .data()
            .iter()
            .map(|(key, row)| match row.get("id") {
                Some(id) if !id.is_null() => Value::from_json(id),
                _ => Value::String(key.clone()),
            })
            .collect();

        if run_remove_hooks(&self.hooks.before_remove, table, &ids) == HookOutcome::Abort {
            return Ok(aborted(table, "before remove"));
        }
        let removed = uow.remove(self.binding.entity(), &ids).await?;
        uow.commit().await?;
        if run_remove_hooks(&self.hooks.after_remove, table, &ids) == HookOutcome::Abort {
            return Ok(aborted(table, "after remove"));
        }

        info!(table = table.name(), removed, "Removed rows");
        Ok(EditorResponse::Data { data: Map::new() })
    }

    fn upload(&self, table: &DataTable, state: &EditorState) -> EditorResponse {
        let handler = state
            .upload_field()
            .and_then(|field| table.column_by_name(field).ok())
            .and_then(|column| column.upload_handler());

        match (handler, state.upload()) {
            (Some(handler), Some(file)) => EditorResponse::Upload(handler(file)),
            _ => failure(table, EMPTY_UPLOAD),
        }
    }

    fn validate(&self, instance: &E, table: &DataTable) -> Vec<FieldError> {
        let Some(validator) = &self.validator else {
            return Vec::new();
        };
        validator
            .validate(instance, &table.editor().validation_group)
            .into_iter()
            .map(|violation| FieldError {
                name: violation.property_path,
                status: violation.message,
            })
            .collect()
    }
}

fn failure(table: &DataTable, key: &str) -> EditorResponse {
    EditorResponse::Error {
        error: table.trans(key),
    }
}

fn aborted(table: &DataTable, stage: &str) -> EditorResponse {
    warn!(table = table.name(), stage, "Editor hook aborted the action");
    failure(table, ABORTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        binding::BindingKind,
        response::{FIELD_REQUIRED, INTEGER_REQUIRED},
        storage::Violation,
    };
    use async_trait::async_trait;
    use grid::{
        column::{ColumnOptions, kind::ColumnKind},
        editor_state::UploadedFile,
    };
    use model::core::value::EntityRef;
    use serde_json::json;
    use std::{collections::BTreeMap, path::PathBuf};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Note {
        id: Option<i64>,
        text: String,
        rank: i64,
    }

    #[derive(Default)]
    struct Notes {
        rows: BTreeMap<i64, Note>,
        pending: Vec<Note>,
        removed: Vec<Value>,
        commits: usize,
        fail_commit: bool,
    }

    #[async_trait]
    impl UnitOfWork<Note> for Notes {
        async fn find(&mut self, _: &str, id: &str) -> Result<Option<Note>, StorageError> {
            Ok(id.parse().ok().and_then(|id| self.rows.get(&id).cloned()))
        }

        async fn reference(&mut self, entity: &str, id: &Value) -> Result<EntityRef, StorageError> {
            Ok(EntityRef::new(entity, id.clone()))
        }

        async fn persist(&mut self, note: &mut Note) -> Result<(), StorageError> {
            if note.id.is_none() {
                note.id = Some(self.rows.len() as i64 + self.pending.len() as i64 + 1);
            }
            self.pending.push(note.clone());
            Ok(())
        }

        async fn remove(&mut self, _: &str, ids: &[Value]) -> Result<u64, StorageError> {
            self.removed.extend(ids.iter().cloned());
            Ok(ids.len() as u64)
        }

        async fn commit(&mut self) -> Result<(), StorageError> {
            if self.fail_commit {
                return Err(StorageError::Constraint("unique_text".into()));
            }
            for note in self.pending.drain(..) {
                if let Some(id) = note.id {
                    self.rows.insert(id, note);
                }
            }
            self.commits += 1;
            Ok(())
        }
    }

    struct NoShouting;

    impl Validator<Note> for NoShouting {
        fn validate(&self, note: &Note, group: &str) -> Vec<Violation> {
            if group == "Default" && !note.text.is_empty() && note.text == note.text.to_uppercase() {
                vec![Violation::new("text", "Please do not shout")]
            } else {
                Vec::new()
            }
        }
    }

    fn table() -> DataTable {
        let mut table = DataTable::new("notes");
        table
            .add("id", ColumnKind::text(), ColumnOptions::new().hidden().read_only())
            .unwrap()
            .add("text", ColumnKind::text(), ColumnOptions::new().required())
            .unwrap()
            .add("rank", ColumnKind::text(), ColumnOptions::new())
            .unwrap()
            .add(
                "attachment",
                ColumnKind::text(),
                ColumnOptions::new().upload_handler(|file| json!({"upload": {"id": file.name}})),
            )
            .unwrap();
        table.use_editor("Note");
        table
    }

    fn editor() -> Editor<Note> {
        let binding = EntityBinding::new("Note", Note::default)
            .bind_getter("id", |n: &Note| json!(n.id))
            .bind(
                "text",
                BindingKind::String,
                |n: &mut Note, v| n.text = v.as_string().unwrap_or_default(),
                |n| json!(n.text),
            )
            .bind(
                "rank",
                BindingKind::Integer { nullable: false },
                |n: &mut Note, v| n.rank = v.as_i64().unwrap_or_default(),
                |n| json!(n.rank),
            );
        Editor::new(binding).with_validator(Arc::new(NoShouting))
    }

    fn state(action: EditorAction, data: JsonValue) -> EditorState {
        let rows = data
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.as_object().cloned().unwrap()))
            .collect();
        EditorState::with_data(action, rows)
    }

    #[tokio::test]
    async fn test_create_commits_once_and_projects() {
        let mut uow = Notes::default();
        let response = editor()
            .process(
                &table(),
                &mut uow,
                &state(
                    EditorAction::Create,
                    json!({"0": {"text": "first", "rank": "1"}, "1": {"text": "second", "rank": 2}}),
                ),
                &Map::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.to_json(),
            json!({"data": {
                "0": {"id": 1, "text": "first", "rank": 1},
                "1": {"id": 2, "text": "second", "rank": 2}
            }})
        );
        assert_eq!(uow.commits, 1);
        assert_eq!(uow.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_validation_errors_prevent_commit() {
        let mut uow = Notes::default();
        let response = editor()
            .process(
                &table(),
                &mut uow,
                &state(EditorAction::Create, json!({"0": {"text": "HELLO", "rank": "x"}})),
                &Map::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            response,
            EditorResponse::FieldErrors {
                field_errors: vec![
                    FieldError {
                        name: "rank".into(),
                        status: INTEGER_REQUIRED.into()
                    },
                    FieldError {
                        name: "text".into(),
                        status: "Please do not shout".into()
                    },
                ]
            }
        );
        assert_eq!(uow.commits, 0);

        let response = editor()
            .process(
                &table(),
                &mut uow,
                &state(EditorAction::CreateNoValidation, json!({"0": {"text": "HELLO"}})),
                &Map::new(),
            )
            .await
            .unwrap();
        assert!(response.is_success());
        assert_eq!(uow.commits, 1);
    }

    #[tokio::test]
    async fn test_edit_missing_required_and_missing_row() {
        let mut uow = Notes::default();
        uow.rows.insert(4, Note { id: Some(4), text: "old".into(), rank: 1 });

        let response = editor()
            .process(
                &table(),
                &mut uow,
                &state(EditorAction::Edit, json!({"4": {"rank": "3"}})),
                &Map::new(),
            )
            .await
            .unwrap();
        assert_eq!(
            response,
            EditorResponse::FieldErrors {
                field_errors: vec![FieldError {
                    name: "text".into(),
                    status: FIELD_REQUIRED.into()
                }]
            }
        );

        let response = editor()
            .process(
                &table(),
                &mut uow,
                &state(EditorAction::Edit, json!({"4": {"text": "new", "rank": "3"}})),
                &json!({"rank": 9}).as_object().cloned().unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.to_json(), json!({"data": {"4": {"id": 4, "text": "new", "rank": 9}}}));
        assert_eq!(uow.rows[&4].text, "new");

        let response = editor()
            .process(
                &table(),
                &mut uow,
                &state(EditorAction::Edit, json!({"99": {"text": "ghost"}})),
                &Map::new(),
            )
            .await
            .unwrap();
        assert_eq!(response, EditorResponse::Error { error: ENTITY_NOT_FOUND.into() });
    }

    #[tokio::test]
    async fn test_remove_and_hooks() {
        let mut uow = Notes::default();
        let response = editor()
            .process(
                &table(),
                &mut uow,
                &state(EditorAction::Remove, json!({"1": {"id": 1}, "row_2": {}})),
                &Map::new(),
            )
            .await
            .unwrap();
        assert_eq!(response.to_json(), json!({"data": {}}));
        assert_eq!(uow.removed, vec![Value::Int(1), Value::String("row_2".into())]);

        let guarded = editor().before_remove(|_, ids| (ids.len() < 2).into());
        let response = guarded
            .process(
                &table(),
                &mut uow,
                &state(EditorAction::Remove, json!({"5": {"id": 5}, "6": {"id": 6}})),
                &Map::new(),
            )
            .await
            .unwrap();
        assert_eq!(response, EditorResponse::Error { error: ABORTED.into() });
        assert_eq!(uow.removed.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_data_upload_and_storage_failure() {
        let mut uow = Notes::default();
        let response = editor()
            .process(&table(), &mut uow, &state(EditorAction::Create, json!({})), &Map::new())
            .await
            .unwrap();
        assert_eq!(response, EditorResponse::Error { error: EMPTY_DATA.into() });

        let file = UploadedFile {
            name: "scan.pdf".into(),
            mime_type: Some("application/pdf".into()),
            size: 1024,
            path: PathBuf::from("/tmp/scan.pdf"),
        };
        let upload = EditorState::with_upload(EditorAction::Upload, "attachment", file.clone());
        let response = editor()
            .process(&table(), &mut uow, &upload, &Map::new())
            .await
            .unwrap();
        assert_eq!(response, EditorResponse::Upload(json!({"upload": {"id": "scan.pdf"}})));

        let upload = EditorState::with_upload(EditorAction::Upload, "text", file);
        let response = editor()
            .process(&table(), &mut uow, &upload, &Map::new())
            .await
            .unwrap();
        assert_eq!(response, EditorResponse::Error { error: EMPTY_UPLOAD.into() });

        uow.fail_commit = true;
        let response = editor()
            .process(
                &table(),
                &mut uow,
                &state(EditorAction::Create, json!({"0": {"text": "fine"}})),
                &Map::new(),
            )
            .await
            .unwrap();
        assert_eq!(response, EditorResponse::Error { error: STORAGE_FAILED.into() });
    }

    #[tokio::test]
    async fn test_editor_must_be_enabled() {
        let mut plain = DataTable::new("notes");
        plain.add("text", ColumnKind::text(), ColumnOptions::new()).unwrap();
        let result = editor()
            .process(
                &plain,
                &mut Notes::default(),
                &state(EditorAction::Create, json!({"0": {"text": "x"}})),
                &Map::new(),
            )
            .await;
        assert!(matches!(
            result,
            Err(EditorError::Grid(GridError::MissingDependency(_)))
        ));
    }
}
