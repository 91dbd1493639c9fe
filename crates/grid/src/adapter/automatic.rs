//! Default query processor: derives FROM, partial projections and joins from
//! the column fields.

use super::{
    alias::{AliasResolver, JoinRegistry, ProjectionSet, root_alias},
    processor::{ProcessContext, QueryProcessor},
};
use crate::{column::Column, error::GridError};
use model::metadata::{MetadataProvider, entity::EntityMetadata};
use query::builder::query::{QueryBuilder, Selection};
use tracing::debug;

/// Builds its plan on first use and keeps it for the lifetime of the
/// adapter; later requests only replay it onto a fresh query.
#[derive(Debug, Clone)]
pub struct AutomaticQueryBuilder {
    entity: String,
    root_alias: Option<String>,
    projections: ProjectionSet,
    joins: JoinRegistry,
}

impl AutomaticQueryBuilder {
    pub fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            root_alias: None,
            projections: ProjectionSet::default(),
            joins: JoinRegistry::default(),
        }
    }

    pub fn projections(&self) -> &ProjectionSet {
        &self.projections
    }

    pub fn joins(&self) -> &JoinRegistry {
        &self.joins
    }

    pub fn build(
        &mut self,
        columns: &[Column],
        metadata: &dyn MetadataProvider,
    ) -> Result<(), GridError> {
        if !self.projections.is_empty() || !self.joins.is_empty() {
            return Ok(());
        }

        let root = metadata.metadata_for(&self.entity)?;
        let mut resolver = AliasResolver::new(metadata, root)?;
        for column in columns {
            let Some(field) = column_field(column, root) else {
                continue;
            };
            resolver.resolve(&field)?;
            if let Some(order_field) = column.order_field().filter(|f| *f != field) {
                resolver.resolve(order_field)?;
            }
        }

        self.root_alias = Some(resolver.root_alias().to_string());
        let (projections, joins) = resolver.finish();
        debug!(
            entity = %self.entity,
            aliases = projections.len(),
            joins = joins.len(),
            "Built automatic query plan"
        );
        self.projections = projections;
        self.joins = joins;
        Ok(())
    }
}

/// The explicit field, or the column name when it names a root field.
fn column_field(column: &Column, root: &EntityMetadata) -> Option<String> {
    match column.field() {
        Some(field) => Some(field.to_string()),
        None if root.has_field(column.name()) => Some(column.name().to_string()),
        None => None,
    }
}

impl QueryProcessor for AutomaticQueryBuilder {
    fn process(&mut self, qb: &mut QueryBuilder, ctx: &ProcessContext<'_>) -> Result<(), GridError> {
        self.build(ctx.columns, ctx.metadata)?;

        let root = ctx.metadata.metadata_for(&self.entity)?;
        let alias = self.root_alias.clone().unwrap_or_else(|| root_alias(root));
        qb.from(&root.name, &alias);
        for (alias, fields) in self.projections.iter() {
            qb.add_select(Selection::Partial {
                alias: alias.to_string(),
                fields: fields.to_vec(),
            });
        }
        for join in self.joins.iter() {
            qb.left_join(&join.key, &join.alias);
        }
        Ok(())
    }
}
