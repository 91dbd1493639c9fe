//! Data adapters. [`EntityAdapter`] builds entity queries through a chain of
//! processors, counts, fetches and maps rows back onto the columns.

pub mod alias;
pub mod automatic;
pub mod criteria;
pub mod hydrate;
pub mod mapper;
pub mod processor;

use crate::{
    backend::{QueryExecutor, SqlQuery},
    column::Column,
    error::GridError,
    state::GridState,
};
use alias::{AliasTable, root_alias};
use async_trait::async_trait;
use automatic::AutomaticQueryBuilder;
use criteria::SearchCriteriaProvider;
use futures::TryStreamExt;
use hydrate::Hydrator;
use mapper::{read_property, to_property_path};
use model::metadata::MetadataProvider;
use processor::{ProcessContext, QueryProcessor};
use query::{builder::query::QueryBuilder, lower::lower};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use tracing::{debug, info};

/// Key of the row identifier in every data row.
pub const ROW_ID_KEY: &str = "DT_RowId";

/// Post-processes a mapped row, given the hydrated source row.
pub type RowTransformer =
    Arc<dyn Fn(Map<String, JsonValue>, &JsonValue) -> Map<String, JsonValue> + Send + Sync>;

/// Notation of property paths into hydrated rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HydrationMode {
    /// `author.name`
    #[default]
    Object,
    /// `[author][name]`
    Array,
}

pub struct DataRequest<'a> {
    pub state: &'a GridState,
    pub columns: &'a [Column],
    pub transformer: Option<&'a RowTransformer>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub total: u64,
    pub filtered: u64,
    pub data: Vec<Map<String, JsonValue>>,
}

#[async_trait]
pub trait Adapter: Send + Sync {
    /// Gives columns without a field their conventional default.
    fn prepare_columns(&self, columns: &mut [Column]) -> Result<(), GridError>;

    async fn get_data(&mut self, request: DataRequest<'_>) -> Result<ResultSet, GridError>;
}

pub struct AdapterOptions {
    pub entity: String,
    pub hydrate: HydrationMode,
    /// Processors producing the base query. Empty means automatic.
    pub query: Vec<Box<dyn QueryProcessor>>,
    pub criteria: Vec<Box<dyn QueryProcessor>>,
}

impl AdapterOptions {
    pub fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            hydrate: HydrationMode::default(),
            query: Vec::new(),
            criteria: vec![Box::new(SearchCriteriaProvider)],
        }
    }

    pub fn hydrate(mut self, mode: HydrationMode) -> Self {
        self.hydrate = mode;
        self
    }

    pub fn query(mut self, processor: Box<dyn QueryProcessor>) -> Self {
        self.query.push(processor);
        self
    }

    pub fn criteria(mut self, processor: Box<dyn QueryProcessor>) -> Self {
        self.criteria.push(processor);
        self
    }

    pub fn without_criteria(mut self) -> Self {
        self.criteria.clear();
        self
    }
}

/// Everything needed to answer one request, built before any statement runs.
pub struct AdapterQuery {
    /// Query after the query processors, counted for the total.
    pub base: QueryBuilder,
    /// Query after the criteria processors; `None` when they added nothing.
    pub filtered: Option<QueryBuilder>,
    /// Filtered query with ordering and paging applied.
    pub data: QueryBuilder,
    /// `rootAlias.identifier`
    pub identifier: String,
    pub aliases: AliasTable,
    pub identifier_path: String,
}

/// Rendered statements of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub total: SqlQuery,
    pub filtered: Option<SqlQuery>,
    pub data: SqlQuery,
}

pub struct EntityAdapter {
    metadata: Arc<dyn MetadataProvider>,
    executor: Arc<dyn QueryExecutor>,
    entity: String,
    hydration: HydrationMode,
    query_processors: Vec<Box<dyn QueryProcessor>>,
    criteria_processors: Vec<Box<dyn QueryProcessor>>,
}

impl EntityAdapter {
    pub fn new(
        metadata: Arc<dyn MetadataProvider>,
        executor: Arc<dyn QueryExecutor>,
        options: AdapterOptions,
    ) -> Result<Self, GridError> {
        let entity = metadata
            .metadata_for(&options.entity)
            .map_err(|e| {
                GridError::Configuration(format!(
                    "No metadata for entity \"{}\", is it registered? ({e})",
                    options.entity
                ))
            })?
            .name
            .clone();

        let mut query_processors = options.query;
        if query_processors.is_empty() {
            query_processors.push(Box::new(AutomaticQueryBuilder::new(&entity)));
        }

        Ok(Self {
            metadata,
            executor,
            entity,
            hydration: options.hydrate,
            query_processors,
            criteria_processors: options.criteria,
        })
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn hydration(&self) -> HydrationMode {
        self.hydration
    }

    pub fn add_criteria_processor(&mut self, processor: Box<dyn QueryProcessor>) {
        self.criteria_processors.push(processor);
    }

    /// Runs the processor chain and applies ordering and paging.
    pub fn prepare_query(
        &mut self,
        state: &GridState,
        columns: &[Column],
    ) -> Result<AdapterQuery, GridError> {
        let metadata = Arc::clone(&self.metadata);
        let ctx = ProcessContext {
            metadata: metadata.as_ref(),
            columns,
            state,
        };

        let mut qb = QueryBuilder::new();
        for processor in &mut self.query_processors {
            processor.process(&mut qb, &ctx)?;
        }
        let root = qb.root().cloned().ok_or_else(|| {
            GridError::Configuration("Query processors produced no root entity".to_string())
        })?;
        let root_meta = metadata.metadata_for(&root.entity)?;
        let identifier = format!("{}.{}", root.alias, root_meta.single_identifier_field()?);
        let base = qb.clone();

        for processor in &mut self.criteria_processors {
            processor.process(&mut qb, &ctx)?;
        }
        let filtered = (qb.predicate() != base.predicate() || qb.joins() != base.joins())
            .then(|| qb.clone());

        let aliases = AliasTable::from_query(&qb, metadata.as_ref())?;
        let identifier_path = to_property_path(&identifier, &aliases, self.hydration)?;

        for (position, direction) in state.order_by() {
            let Some(column) = columns.get(*position) else {
                return Err(GridError::InvalidState(format!(
                    "Ordering refers to unknown column {position}"
                )));
            };
            if !column.is_orderable() {
                continue;
            }
            let Some(order_field) = column.order_field() else {
                continue;
            };
            qb.add_order_by(&aliases.qualify(order_field, metadata.as_ref())?, *direction);
        }
        if state.length() > 0 {
            qb.set_first_result(state.start())
                .set_max_results(state.length().unsigned_abs());
        }

        Ok(AdapterQuery {
            base,
            filtered,
            data: qb,
            identifier,
            aliases,
            identifier_path,
        })
    }

    /// Renders the statements a request would run, without running them.
    pub fn plan(&mut self, state: &GridState, columns: &[Column]) -> Result<QueryPlan, GridError> {
        let query = self.prepare_query(state, columns)?;
        let metadata = self.metadata.as_ref();
        let dialect = self.executor.dialect();
        let render = |qb: &QueryBuilder| -> Result<SqlQuery, GridError> {
            Ok(SqlQuery::render(&lower(qb, metadata)?, dialect))
        };

        Ok(QueryPlan {
            total: render(&query.base.count_query(&query.identifier))?,
            filtered: query
                .filtered
                .as_ref()
                .map(|qb| render(&qb.count_query(&query.identifier)))
                .transpose()?,
            data: render(&query.data)?,
        })
    }

    async fn count(&self, qb: &QueryBuilder, identifier: &str) -> Result<u64, GridError> {
        let lowered = lower(&qb.count_query(identifier), self.metadata.as_ref())?;
        let sql = SqlQuery::render(&lowered, self.executor.dialect());
        debug!(sql = %sql.sql, params = sql.params.len(), "Counting rows");
        Ok(self.executor.count(sql).await?)
    }

    /// Property path of every column into the hydrated rows.
    fn column_paths(
        &self,
        query: &AdapterQuery,
        columns: &[Column],
    ) -> Result<Vec<Option<String>>, GridError> {
        columns
            .iter()
            .map(|column| {
                if let Some(path) = column.property_path() {
                    return Ok(Some(path.to_string()));
                }
                let Some(field) = column.field() else {
                    return Ok(None);
                };
                let qualified = query.aliases.qualify(field, self.metadata.as_ref())?;
                to_property_path(&qualified, &query.aliases, self.hydration).map(Some)
            })
            .collect()
    }
}

#[async_trait]
impl Adapter for EntityAdapter {
    fn prepare_columns(&self, columns: &mut [Column]) -> Result<(), GridError> {
        let root = self.metadata.metadata_for(&self.entity)?;
        let alias = root_alias(root);
        for column in columns.iter_mut() {
            if column.field().is_none() && root.has_field(column.name()) {
                let field = format!("{alias}.{}", column.name());
                column.set_field(field);
            }
        }
        Ok(())
    }

    async fn get_data(&mut self, request: DataRequest<'_>) -> Result<ResultSet, GridError> {
        let query = self.prepare_query(request.state, request.columns)?;

        let total = self.count(&query.base, &query.identifier).await?;
        let filtered = match &query.filtered {
            Some(qb) => self.count(qb, &query.identifier).await?,
            None => total,
        };

        let lowered = lower(&query.data, self.metadata.as_ref())?;
        let sql = SqlQuery::render(&lowered, self.executor.dialect());
        debug!(sql = %sql.sql, params = sql.params.len(), "Fetching rows");
        let rows: Vec<_> = self.executor.fetch(sql).await?.try_collect().await?;

        let hydrator = Hydrator::new(&query.aliases, self.metadata.as_ref())?;
        let paths = self.column_paths(&query, request.columns)?;
        let data = hydrator
            .hydrate(rows)
            .iter()
            .map(|row| {
                let mut mapped = Map::new();
                mapped.insert(
                    ROW_ID_KEY.to_string(),
                    read_property(row, &query.identifier_path),
                );
                for (column, path) in request.columns.iter().zip(&paths) {
                    let value = path
                        .as_deref()
                        .map(|p| read_property(row, p))
                        .unwrap_or(JsonValue::Null);
                    mapped.insert(column.name().to_string(), column.transform(value, row));
                }
                match request.transformer {
                    Some(transformer) => transformer(mapped, row),
                    None => mapped,
                }
            })
            .collect::<Vec<_>>();

        info!(
            entity = %self.entity,
            total,
            filtered,
            rows = data.len(),
            "Served grid data"
        );
        Ok(ResultSet {
            total,
            filtered,
            data,
        })
    }
}
