//! Postgres-backed [`QueryExecutor`].

mod connect;
pub mod params;
mod row;

use crate::error::{ConnectorError, storage_error};
use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use grid::{
    backend::{QueryExecutor, RowStream, SqlQuery},
    error::StorageError,
};
use params::PgParamStore;
use query::dialect::{Dialect, Postgres};
use std::sync::Arc;
use tokio_postgres::{Client, Statement};
use tracing::debug;

#[derive(Clone)]
pub struct PgExecutor {
    client: Arc<Client>,
    dialect: Postgres,
}

impl PgExecutor {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let client = connect::connect_client(url).await?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client: Arc::new(client),
            dialect: Postgres,
        }
    }

    async fn prepare(&self, query: &SqlQuery) -> Result<(Statement, PgParamStore), StorageError> {
        let statement = self
            .client
            .prepare(&query.sql)
            .await
            .map_err(storage_error)?;
        let params = PgParamStore::bind(&query.params, statement.params())?;
        Ok((statement, params))
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn count(&self, query: SqlQuery) -> Result<u64, StorageError> {
        let (statement, params) = self.prepare(&query).await?;
        let row = self
            .client
            .query_one(&statement, &params.as_refs())
            .await
            .map_err(storage_error)?;
        let count: i64 = row.try_get(0).map_err(storage_error)?;
        debug!(count, "Counted rows");
        Ok(count.max(0).unsigned_abs())
    }

    async fn fetch(&self, query: SqlQuery) -> Result<RowStream, StorageError> {
        let (statement, params) = self.prepare(&query).await?;
        let rows = self
            .client
            .query_raw(&statement, params.as_refs())
            .await
            .map_err(storage_error)?;

        let labels = query.labels;
        Ok(rows
            .map_err(storage_error)
            .map_ok(move |r| row::to_row_data(&r, &labels))
            .boxed())
    }
}
