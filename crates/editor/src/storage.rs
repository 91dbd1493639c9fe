//! Collaborators the editor persists and validates through.

use async_trait::async_trait;
use grid::error::StorageError;
use model::core::value::{EntityRef, Value};
use serde::{Deserialize, Serialize};

/// Transactional access to the entities of one type. Changes become visible
/// on [`UnitOfWork::commit`], which the editor calls at most once per batch.
#[async_trait]
pub trait UnitOfWork<E: Send>: Send {
    async fn find(&mut self, entity: &str, id: &str) -> Result<Option<E>, StorageError>;

    /// A lazy handle to `entity#id`. Fails when the target cannot exist.
    async fn reference(&mut self, entity: &str, id: &Value) -> Result<EntityRef, StorageError>;

    /// Schedules a new or modified instance. May assign its identifier.
    async fn persist(&mut self, instance: &mut E) -> Result<(), StorageError>;

    async fn remove(&mut self, entity: &str, ids: &[Value]) -> Result<u64, StorageError>;

    async fn commit(&mut self) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub property_path: String,
    pub message: String,
}

impl Violation {
    pub fn new(property_path: &str, message: &str) -> Self {
        Self {
            property_path: property_path.to_string(),
            message: message.to_string(),
        }
    }
}

pub trait Validator<E>: Send + Sync {
    fn validate(&self, instance: &E, group: &str) -> Vec<Violation>;
}
