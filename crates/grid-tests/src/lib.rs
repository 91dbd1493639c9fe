#![allow(dead_code)]

use async_trait::async_trait;
use futures::{StreamExt, stream};
use grid::{
    backend::{QueryExecutor, RowStream, SqlQuery},
    error::StorageError,
};
use model::{
    core::data_type::FieldType,
    metadata::{
        entity::{AssociationMapping, EntityMetadata, FieldMapping},
        registry::MetadataRegistry,
    },
    records::row::RowData,
};
use query::dialect::{Dialect, Postgres};
use std::sync::{Arc, Mutex};

pub mod draw;
pub mod editing;

/// Books and their authors, employees reporting to department managers,
/// contacts working for companies.
pub fn library() -> MetadataRegistry {
    MetadataRegistry::new()
        .with(
            EntityMetadata::new("App\\Entity\\Book", "book", "id")
                .with_field(FieldMapping::new("id", FieldType::Integer))
                .with_field(FieldMapping::new("title", FieldType::String))
                .with_field(FieldMapping::new("pages", FieldType::Integer))
                .with_association(AssociationMapping::many_to_one(
                    "author",
                    "App\\Entity\\Author",
                    "author_id",
                    "id",
                )),
        )
        .with(
            EntityMetadata::new("App\\Entity\\Author", "author", "id")
                .with_field(FieldMapping::new("id", FieldType::Integer))
                .with_field(FieldMapping::new("name", FieldType::String)),
        )
        .with(
            EntityMetadata::new("App\\Entity\\Employee", "employee", "id")
                .with_field(FieldMapping::new("id", FieldType::Integer))
                .with_field(FieldMapping::new("name", FieldType::String))
                .with_association(AssociationMapping::many_to_one(
                    "department",
                    "App\\Entity\\Department",
                    "department_id",
                    "id",
                )),
        )
        .with(
            EntityMetadata::new("App\\Entity\\Department", "department", "id")
                .with_field(FieldMapping::new("id", FieldType::Integer))
                .with_field(FieldMapping::new("title", FieldType::String))
                .with_association(AssociationMapping::many_to_one(
                    "manager",
                    "App\\Entity\\Employee",
                    "manager_id",
                    "id",
                )),
        )
        .with(
            EntityMetadata::new("App\\Entity\\Contact", "contact", "id")
                .with_field(FieldMapping::new("id", FieldType::Integer))
                .with_field(FieldMapping::new("name", FieldType::String))
                .with_field(FieldMapping::new("email", FieldType::String))
                .with_association(AssociationMapping::many_to_one(
                    "company",
                    "App\\Entity\\Company",
                    "company_id",
                    "id",
                )),
        )
        .with(
            EntityMetadata::new("App\\Entity\\Company", "company", "id")
                .with_field(FieldMapping::new("id", FieldType::Integer))
                .with_field(FieldMapping::new("name", FieldType::String)),
        )
}

/// Executor that records every statement and answers with canned data.
pub struct RecordingExecutor {
    dialect: Postgres,
    count: u64,
    rows: Vec<RowData>,
    queries: Mutex<Vec<SqlQuery>>,
}

impl RecordingExecutor {
    pub fn new(count: u64, rows: Vec<RowData>) -> Arc<Self> {
        Arc::new(Self {
            dialect: Postgres,
            count,
            rows,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::new(0, Vec::new())
    }

    pub fn queries(&self) -> Vec<SqlQuery> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }

    fn record(&self, query: SqlQuery) {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query);
        }
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn count(&self, query: SqlQuery) -> Result<u64, StorageError> {
        self.record(query);
        Ok(self.count)
    }

    async fn fetch(&self, query: SqlQuery) -> Result<RowStream, StorageError> {
        self.record(query);
        Ok(stream::iter(self.rows.clone().into_iter().map(Ok)).boxed())
    }
}
