//! Lowers an entity-level `QueryBuilder` into a SQL `Select`, resolving
//! aliases, fields and association joins through entity metadata.

use crate::{
    ast::{
        expr::{BinaryOperator, Expr, FunctionCall},
        select::{JoinClause, Select},
    },
    builder::{
        predicate::{Operator, Predicate},
        query::{QueryBuilder, Selection},
        select::SelectBuilder,
    },
    dialect::Dialect,
    error::QueryError,
    ident_as, qualified,
    renderer::render_ast,
    table_ref, value,
};
use model::{
    core::value::Value,
    metadata::{MetadataProvider, entity::EntityMetadata, error::MetadataError},
};
use std::collections::HashMap;
use tracing::debug;

/// Result label used for `COUNT(..)` selections.
pub const COUNT_LABEL: &str = "count";

/// A SQL statement plus the result label of every selected column, in
/// select-list order. Entity columns are labelled `alias.field`.
#[derive(Debug, Clone)]
pub struct LoweredQuery {
    pub select: Select,
    pub labels: Vec<String>,
}

impl LoweredQuery {
    pub fn render(&self, dialect: &dyn Dialect) -> (String, Vec<Value>) {
        render_ast(&self.select, dialect)
    }
}

pub fn lower(qb: &QueryBuilder, metadata: &dyn MetadataProvider) -> Result<LoweredQuery, QueryError> {
    let root = qb.root().ok_or(QueryError::MissingFrom)?;
    if qb.from_entities().len() > 1 {
        return Err(QueryError::MultipleFrom(qb.from_entities().len()));
    }

    let root_meta = metadata.metadata_for(&root.entity)?;
    let mut scope = Scope::default();
    scope.aliases.insert(root.alias.clone(), root_meta);

    let mut joins = Vec::with_capacity(qb.joins().len());
    for join in qb.joins() {
        let (parent_alias, association) = join
            .parts()
            .ok_or_else(|| QueryError::InvalidJoinPath(join.path.clone()))?;
        let parent = scope.entity(parent_alias)?;
        let mapping = parent.association_or_err(association)?;
        let target = metadata.metadata_for(&mapping.target_entity)?;
        let conditions: Vec<Expr> = mapping
            .join_columns
            .iter()
            .map(|jc| {
                Expr::binary(
                    qualified(parent_alias, &jc.source),
                    BinaryOperator::Eq,
                    qualified(&join.alias, &jc.target),
                )
            })
            .collect();
        let Some(on) = Expr::chain(BinaryOperator::And, conditions) else {
            return Err(QueryError::MissingJoinColumns {
                entity: parent.name.clone(),
                association: association.to_string(),
            });
        };

        joins.push(JoinClause {
            kind: join.kind,
            table: table_ref!(target.table),
            alias: Some(join.alias.clone()),
            on,
        });
        scope.aliases.insert(join.alias.clone(), target);
    }

    let mut columns = Vec::new();
    let mut labels = Vec::new();
    let selects = match qb.selects() {
        [] => vec![Selection::Entity(root.alias.clone())],
        selects => selects.to_vec(),
    };
    for selection in &selects {
        match selection {
            Selection::Partial { alias, fields } => {
                let meta = scope.entity(alias)?;
                for field in fields {
                    let column = meta.field_or_err(field)?.column_name();
                    let label = format!("{alias}.{field}");
                    columns.push(ident_as!(alias, column, label));
                    labels.push(label);
                }
            }
            Selection::Entity(alias) => {
                let meta = scope.entity(alias)?;
                for field in &meta.fields {
                    let label = format!("{alias}.{}", field.name);
                    columns.push(ident_as!(alias, field.column_name(), label));
                    labels.push(label);
                }
            }
            Selection::Count { field, distinct } => {
                columns.push(Expr::Alias {
                    expr: Box::new(Expr::FunctionCall(FunctionCall {
                        name: "COUNT".to_string(),
                        args: vec![scope.column(field)?],
                        wildcard: false,
                        distinct: *distinct,
                    })),
                    alias: COUNT_LABEL.to_string(),
                });
                labels.push(COUNT_LABEL.to_string());
            }
        }
    }

    let where_clause = match qb.predicate() {
        Some(predicate) => scope.predicate(predicate)?,
        None => None,
    };

    let group_by = qb
        .group_by()
        .iter()
        .map(|field| scope.column(field))
        .collect::<Result<Vec<_>, _>>()?;

    let mut builder = SelectBuilder::new()
        .columns(columns)
        .from(table_ref!(root_meta.table), &root.alias)
        .joins(joins)
        .and_where(where_clause)
        .group_by(group_by);
    for (field, dir) in qb.order_by() {
        builder = builder.order_by(scope.column(field)?, *dir);
    }
    let select = builder
        .paginate(
            qb.max_results().map(bound_int),
            qb.first_result().map(bound_int),
        )
        .build();

    debug!(
        "Lowered query on '{}' with {} join(s) and {} column(s)",
        root_meta.name,
        select.joins.len(),
        labels.len()
    );

    Ok(LoweredQuery { select, labels })
}

fn bound_int(n: u64) -> Expr {
    value(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
}

#[derive(Default)]
struct Scope<'m> {
    aliases: HashMap<String, &'m EntityMetadata>,
}

impl<'m> Scope<'m> {
    fn entity(&self, alias: &str) -> Result<&'m EntityMetadata, QueryError> {
        self.aliases
            .get(alias)
            .copied()
            .ok_or_else(|| QueryError::UnknownAlias(alias.to_string()))
    }

    /// Resolves `alias.field` to a qualified column. A to-one association
    /// name resolves to its foreign key column.
    fn column(&self, reference: &str) -> Result<Expr, QueryError> {
        let (alias, field) = reference
            .split_once('.')
            .ok_or_else(|| QueryError::InvalidFieldReference(reference.to_string()))?;
        let meta = self.entity(alias)?;

        if let Some(mapping) = meta.field(field) {
            return Ok(qualified(alias, mapping.column_name()));
        }
        match meta.association(field) {
            Some(assoc) if !assoc.kind.is_to_many() && assoc.join_columns.len() == 1 => {
                Ok(qualified(alias, &assoc.join_columns[0].source))
            }
            _ => Err(MetadataError::UnknownField {
                entity: meta.name.clone(),
                field: field.to_string(),
            }
            .into()),
        }
    }

    /// Whether `alias.field` names a textual scalar. Anything else is cast
    /// before pattern matching.
    fn is_textual(&self, reference: &str) -> bool {
        reference
            .split_once('.')
            .and_then(|(alias, field)| self.aliases.get(alias)?.field(field))
            .is_some_and(|mapping| mapping.field_type.is_textual())
    }

    fn predicate(&self, predicate: &Predicate) -> Result<Option<Expr>, QueryError> {
        match predicate {
            Predicate::Compare { field, op, value: v } => {
                let column = self.column(field)?;
                let operand = value(v.clone());
                let expr = match op {
                    Operator::Like if !self.is_textual(field) => Expr::Like {
                        expr: Box::new(Expr::TextCast(Box::new(column))),
                        pattern: Box::new(operand),
                    },
                    Operator::Like => Expr::Like {
                        expr: Box::new(column),
                        pattern: Box::new(operand),
                    },
                    Operator::Eq => Expr::binary(column, BinaryOperator::Eq, operand),
                    Operator::NotEq => Expr::binary(column, BinaryOperator::NotEq, operand),
                    Operator::Lt => Expr::binary(column, BinaryOperator::Lt, operand),
                    Operator::LtEq => Expr::binary(column, BinaryOperator::LtEq, operand),
                    Operator::Gt => Expr::binary(column, BinaryOperator::Gt, operand),
                    Operator::GtEq => Expr::binary(column, BinaryOperator::GtEq, operand),
                };
                Ok(Some(expr))
            }
            Predicate::And(parts) => self.junction(BinaryOperator::And, parts),
            Predicate::Or(parts) => self.junction(BinaryOperator::Or, parts),
        }
    }

    fn junction(&self, op: BinaryOperator, parts: &[Predicate]) -> Result<Option<Expr>, QueryError> {
        let mut exprs = Vec::with_capacity(parts.len());
        for part in parts {
            if let Some(expr) = self.predicate(part)? {
                exprs.push(expr);
            }
        }
        Ok(Expr::chain(op, exprs))
    }
}
