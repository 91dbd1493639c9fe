//! Storage-facing seam of the grid: rendered SQL goes in, rows come out.

use crate::error::StorageError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use model::{core::value::Value, records::row::RowData};
use query::{dialect::Dialect, lower::LoweredQuery};

/// A rendered statement with its bound parameters and the label of every
/// result column, in select-list order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
    pub labels: Vec<String>,
}

impl SqlQuery {
    pub fn render(lowered: &LoweredQuery, dialect: &dyn Dialect) -> Self {
        let (sql, params) = lowered.render(dialect);
        Self {
            sql,
            params,
            labels: lowered.labels.clone(),
        }
    }
}

pub type RowStream = BoxStream<'static, Result<RowData, StorageError>>;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    fn dialect(&self) -> &dyn Dialect;

    /// Runs a single-value `COUNT(..)` statement.
    async fn count(&self, query: SqlQuery) -> Result<u64, StorageError>;

    /// Runs a statement and streams its rows. Every row carries one field per
    /// entry of `query.labels`, named after the label.
    async fn fetch(&self, query: SqlQuery) -> Result<RowStream, StorageError>;
}

/// Executor without a database. Used to plan and print statements.
pub struct DryRunExecutor {
    dialect: Box<dyn Dialect>,
}

impl DryRunExecutor {
    pub fn new(dialect: Box<dyn Dialect>) -> Self {
        Self { dialect }
    }
}

#[async_trait]
impl QueryExecutor for DryRunExecutor {
    fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    async fn count(&self, _query: SqlQuery) -> Result<u64, StorageError> {
        Err(StorageError::Connection(
            "dry-run executor has no database".to_string(),
        ))
    }

    async fn fetch(&self, _query: SqlQuery) -> Result<RowStream, StorageError> {
        Err(StorageError::Connection(
            "dry-run executor has no database".to_string(),
        ))
    }
}
