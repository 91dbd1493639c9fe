//! In-memory persistence for editor scenarios.

use async_trait::async_trait;
use editor::storage::{UnitOfWork, Validator, Violation};
use grid::error::StorageError;
use model::core::value::{EntityRef, Value};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contact {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub company: Option<EntityRef>,
}

/// Contacts keyed by id. Only known company ids can be referenced.
#[derive(Default)]
pub struct ContactStore {
    pub contacts: BTreeMap<i64, Contact>,
    pub companies: BTreeSet<i64>,
    pub pending: Vec<Contact>,
    pub removed: Vec<Value>,
    pub commits: usize,
}

impl ContactStore {
    pub fn with_companies(ids: &[i64]) -> Self {
        Self {
            companies: ids.iter().copied().collect(),
            ..Self::default()
        }
    }

    fn next_id(&self) -> i64 {
        let stored = self.contacts.keys().max().copied().unwrap_or(0);
        let pending = self.pending.iter().filter_map(|c| c.id).max().unwrap_or(0);
        stored.max(pending) + 1
    }
}

#[async_trait]
impl UnitOfWork<Contact> for ContactStore {
    async fn find(&mut self, _entity: &str, id: &str) -> Result<Option<Contact>, StorageError> {
        Ok(id.parse().ok().and_then(|id| self.contacts.get(&id).cloned()))
    }

    async fn reference(&mut self, entity: &str, id: &Value) -> Result<EntityRef, StorageError> {
        match id.as_i64() {
            Some(key) if self.companies.contains(&key) => Ok(EntityRef::new(entity, Value::Int(key))),
            _ => Err(StorageError::NotFound(format!("{entity}#{id}"))),
        }
    }

    async fn persist(&mut self, contact: &mut Contact) -> Result<(), StorageError> {
        if contact.id.is_none() {
            contact.id = Some(self.next_id());
        }
        self.pending.push(contact.clone());
        Ok(())
    }

    async fn remove(&mut self, _entity: &str, ids: &[Value]) -> Result<u64, StorageError> {
        self.removed.extend(ids.iter().cloned());
        Ok(ids.len() as u64)
    }

    async fn commit(&mut self) -> Result<(), StorageError> {
        for contact in self.pending.drain(..) {
            if let Some(id) = contact.id {
                self.contacts.insert(id, contact);
            }
        }
        for id in self.removed.iter().filter_map(Value::as_i64) {
            self.contacts.remove(&id);
        }
        self.commits += 1;
        Ok(())
    }
}

/// Rejects addresses without an `@`.
pub struct EmailValidator;

impl Validator<Contact> for EmailValidator {
    fn validate(&self, contact: &Contact, _group: &str) -> Vec<Violation> {
        if contact.email.is_empty() || contact.email.contains('@') {
            Vec::new()
        } else {
            vec![Violation::new("email", "This value is not a valid email address.")]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RecordingExecutor, library};
    use editor::{
        binding::{BindingKind, EntityBinding},
        editor::Editor,
        hooks::HookOutcome,
        response::{ABORTED, ENTITY_NOT_FOUND, EditorResponse, FIELD_REQUIRED, FieldError},
    };
    use grid::{definition::TableDefinition, factory::GridFactory, table::DataTable};
    use serde_json::{Map, Value as JsonValue, json};
    use std::sync::Arc;
    use tracing_test::traced_test;

    const CONTACTS: &str = r#"{
        "name": "contacts",
        "entity": "Contact",
        "columns": [
            {"name": "id", "kind": "text", "hidden": true, "editable": false},
            {"name": "name", "kind": "text"},
            {"name": "email", "kind": "text", "required": true},
            {"name": "company", "kind": "text", "field": "company.name"}
        ],
        "editor": {"buttons": ["create", "edit", "remove"]}
    }"#;

    fn table() -> DataTable {
        TableDefinition::from_json(CONTACTS)
            .unwrap()
            .build(&GridFactory::default(), Arc::new(library()), RecordingExecutor::empty())
            .unwrap()
    }

    fn editor() -> Editor<Contact> {
        let binding = EntityBinding::new("Contact", Contact::default)
            .bind_getter("id", |c: &Contact| json!(c.id))
            .bind(
                "name",
                BindingKind::String,
                |c: &mut Contact, v| c.name = v.as_string().unwrap_or_default(),
                |c| json!(c.name),
            )
            .bind(
                "email",
                BindingKind::String,
                |c: &mut Contact, v| c.email = v.as_string().unwrap_or_default(),
                |c| json!(c.email),
            )
            .bind(
                "company",
                BindingKind::Relation {
                    target: "Company".into(),
                    nullable: true,
                },
                |c: &mut Contact, v| {
                    c.company = match v {
                        Value::Reference(r) => Some(r),
                        _ => None,
                    }
                },
                |c| json!(c.company.as_ref().map(|r| r.id.to_json())),
            );
        Editor::new(binding).with_validator(Arc::new(EmailValidator))
    }

    async fn submit(
        table: &mut DataTable,
        editor: &Editor<Contact>,
        store: &mut ContactStore,
        params: JsonValue,
    ) -> EditorResponse {
        table.handle_request(&params, None).unwrap();
        let state = table.editor_state().cloned().unwrap();
        editor.process(table, store, &state, &Map::new()).await.unwrap()
    }

    #[traced_test]
    #[tokio::test]
    async fn test_missing_required_email_is_reported_without_commit() {
        let mut store = ContactStore::with_companies(&[1]);
        let response = submit(
            &mut table(),
            &editor(),
            &mut store,
            json!({"action": "create", "data": {"0": {"name": "Ann", "company": "1"}}}),
        )
        .await;

        assert_eq!(
            response,
            EditorResponse::FieldErrors {
                field_errors: vec![FieldError {
                    name: "email".into(),
                    status: FIELD_REQUIRED.into()
                }]
            }
        );
        assert_eq!(store.commits, 0);
        assert!(store.contacts.is_empty());
    }

    #[traced_test]
    #[tokio::test]
    async fn test_create_resolves_relation_and_projects_saved_row() {
        let mut store = ContactStore::with_companies(&[12]);
        let response = submit(
            &mut table(),
            &editor(),
            &mut store,
            json!({"action": "create", "data": {"0": {
                "name": "Ann",
                "email": "ann@example.com",
                "company": "12"
            }}}),
        )
        .await;

        assert_eq!(
            response.to_json(),
            json!({"data": {"0": {
                "id": 1,
                "name": "Ann",
                "email": "ann@example.com",
                "company": 12
            }}})
        );
        assert_eq!(store.commits, 1);
        assert_eq!(
            store.contacts[&1].company,
            Some(EntityRef::new("Company", Value::Int(12)))
        );
    }

    #[traced_test]
    #[tokio::test]
    async fn test_unknown_relation_and_validator_errors_are_collected() {
        let mut store = ContactStore::with_companies(&[1]);
        let response = submit(
            &mut table(),
            &editor(),
            &mut store,
            json!({"action": "create", "data": {"0": {
                "name": "Ann",
                "email": "not-an-address",
                "company": "99"
            }}}),
        )
        .await;

        let EditorResponse::FieldErrors { field_errors } = response else {
            panic!("expected field errors, got {response:?}");
        };
        let names: Vec<_> = field_errors.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"company"));
        assert!(names.contains(&"email"));
        assert!(field_errors.iter().any(|e| e.status == ENTITY_NOT_FOUND));
        assert_eq!(store.commits, 0);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_edit_updates_stored_contact() {
        let mut store = ContactStore::with_companies(&[1]);
        store.contacts.insert(
            5,
            Contact {
                id: Some(5),
                name: "Bob".into(),
                email: "bob@example.com".into(),
                company: None,
            },
        );

        let response = submit(
            &mut table(),
            &editor(),
            &mut store,
            json!({"action": "edit", "data": {"5": {
                "name": "Robert",
                "email": "robert@example.com",
                "company": "1"
            }}}),
        )
        .await;

        assert!(response.is_success(), "{response:?}");
        assert_eq!(store.commits, 1);
        assert_eq!(store.contacts[&5].name, "Robert");
        assert_eq!(store.contacts[&5].company, Some(EntityRef::new("Company", Value::Int(1))));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_remove_can_be_vetoed() {
        let mut store = ContactStore::default();
        let vetoing = editor().before_remove(|_, ids| HookOutcome::from(ids.len() < 2));

        let response = submit(
            &mut table(),
            &vetoing,
            &mut store,
            json!({"action": "remove", "data": {"1": {"id": 1}, "2": {"id": 2}}}),
        )
        .await;
        assert_eq!(
            response,
            EditorResponse::Error {
                error: ABORTED.into()
            }
        );
        assert!(store.removed.is_empty());

        let response = submit(
            &mut table(),
            &vetoing,
            &mut store,
            json!({"action": "remove", "data": {"1": {"id": 1}}}),
        )
        .await;
        assert_eq!(response.to_json(), json!({"data": {}}));
        assert_eq!(store.removed, vec![Value::Int(1)]);
        assert_eq!(store.commits, 1);
    }
}
