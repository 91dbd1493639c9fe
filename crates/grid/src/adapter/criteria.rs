//! Default criteria processor: per-column filters and the global search.

use super::{
    alias::AliasTable,
    processor::{ProcessContext, QueryProcessor},
};
use crate::error::GridError;
use model::core::{data_type::FieldType, value::Value};
use query::builder::{
    predicate::{Operator, Predicate},
    query::QueryBuilder,
};
use tracing::{debug, warn};

/// Every search term ends up as a bound parameter; fields are qualified
/// against the joins already present on the query.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchCriteriaProvider;

impl SearchCriteriaProvider {
    fn column_predicates(
        &self,
        aliases: &AliasTable,
        ctx: &ProcessContext<'_>,
    ) -> Result<Vec<Predicate>, GridError> {
        let mut predicates = Vec::new();
        for (position, term) in ctx.state.search_columns() {
            let column = ctx.columns.get(*position).ok_or_else(|| {
                GridError::InvalidState(format!("Search refers to unknown column {position}"))
            })?;
            if term.is_empty() {
                continue;
            }
            let Some(operator) = column.operator() else {
                continue;
            };
            let Some(field) = column.field() else {
                warn!(column = column.name(), "Searchable column has no field, ignoring its search");
                continue;
            };

            let field = aliases.qualify(field, ctx.metadata)?;
            predicates.push(match operator {
                Operator::Like => Predicate::contains(field, term),
                op => {
                    let field_type = aliases.field_type(&field, ctx.metadata);
                    Predicate::compare(field, op, coerce(column.search_value(term), field_type))
                }
            });
        }
        Ok(predicates)
    }

    fn global_predicate(&self, aliases: &AliasTable, ctx: &ProcessContext<'_>) -> Option<Predicate> {
        let term = ctx.state.global_search().filter(|t| !t.is_empty())?;
        let alternatives: Vec<Predicate> = ctx
            .columns
            .iter()
            .filter(|column| column.is_global_searchable())
            .filter_map(|column| {
                let field = column.field()?;
                match aliases.qualify(field, ctx.metadata) {
                    Ok(field) => Some(Predicate::contains(field, term)),
                    Err(e) => {
                        warn!(column = column.name(), error = %e, "Skipping column in global search");
                        None
                    }
                }
            })
            .collect();

        (!alternatives.is_empty()).then_some(Predicate::Or(alternatives))
    }
}

/// Numeric fields compare against numbers when the term parses as one.
fn coerce(value: Value, field_type: Option<FieldType>) -> Value {
    let Value::String(term) = &value else {
        return value;
    };
    let parsed = match field_type {
        Some(t) if t.is_integer() => term.trim().parse().ok().map(Value::Int),
        Some(FieldType::Float | FieldType::Decimal) => term.trim().parse().ok().map(Value::Float),
        _ => None,
    };
    parsed.unwrap_or(value)
}

impl QueryProcessor for SearchCriteriaProvider {
    fn process(&mut self, qb: &mut QueryBuilder, ctx: &ProcessContext<'_>) -> Result<(), GridError> {
        let aliases = AliasTable::from_query(qb, ctx.metadata)?;

        let predicates = self.column_predicates(&aliases, ctx)?;
        let global = self.global_predicate(&aliases, ctx);
        debug!(
            columns = predicates.len(),
            global = global.is_some(),
            "Applying search criteria"
        );

        for predicate in predicates {
            qb.and_where(predicate);
        }
        if let Some(global) = global {
            qb.and_where(global);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        column::{Column, ColumnOptions, filter::Filter, kind::ColumnKind},
        state::GridState,
    };
    use model::metadata::{
        entity::{AssociationMapping, EntityMetadata, FieldMapping},
        registry::MetadataRegistry,
    };
    use query::{dialect::Postgres, lower::lower};

    fn registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with(
                EntityMetadata::new("Book", "book", "id")
                    .with_field(FieldMapping::new("id", FieldType::Integer))
                    .with_field(FieldMapping::new("title", FieldType::String))
                    .with_field(FieldMapping::new("pages", FieldType::Integer))
                    .with_field(FieldMapping::new("published", FieldType::Boolean))
                    .with_association(AssociationMapping::many_to_one(
                        "author", "Author", "author_id", "id",
                    )),
            )
            .with(
                EntityMetadata::new("Author", "author", "id")
                    .with_field(FieldMapping::new("id", FieldType::Integer))
                    .with_field(FieldMapping::new("name", FieldType::String)),
            )
    }

    fn columns() -> Vec<Column> {
        let text = |name: &str, index, options| {
            Column::new(name, index, "books", ColumnKind::text(), options).unwrap()
        };
        vec![
            text("id", 0, ColumnOptions::new().field("_book.id").global_searchable(false)),
            text("title", 1, ColumnOptions::new().field("_book.title").filter(Filter::new())),
            text("author", 2, ColumnOptions::new().field("author.name")),
            text(
                "pages",
                3,
                ColumnOptions::new()
                    .field("_book.pages")
                    .filter(Filter::with_operator(Operator::GtEq))
                    .global_searchable(false),
            ),
            Column::new(
                "published",
                4,
                "books",
                ColumnKind::boolean(),
                ColumnOptions::new()
                    .field("_book.published")
                    .filter(Filter::new())
                    .global_searchable(false),
            )
            .unwrap(),
        ]
    }

    fn base_query() -> QueryBuilder {
        let mut qb = QueryBuilder::new();
        qb.from("Book", "_book").left_join("_book.author", "author");
        qb
    }

    fn run(state: &GridState) -> QueryBuilder {
        let registry = registry();
        let columns = columns();
        let mut qb = base_query();
        let ctx = ProcessContext {
            metadata: &registry,
            columns: &columns,
            state,
        };
        SearchCriteriaProvider.process(&mut qb, &ctx).unwrap();
        qb
    }

    #[test]
    fn test_column_filters_bind_terms() {
        let mut state = GridState::default();
        state.set_column_search(1, "50%_o'k");
        state.set_column_search(3, "100");
        state.set_column_search(4, "true");
        let qb = run(&state);

        let comparisons = qb.predicate().unwrap().comparisons();
        assert_eq!(
            comparisons,
            vec![
                ("_book.title", Operator::Like, &Value::String(r"%50\%\_o'k%".to_string())),
                ("_book.pages", Operator::GtEq, &Value::Int(100)),
                ("_book.published", Operator::Eq, &Value::Boolean(true)),
            ]
        );

        let (sql, params) = lower(&qb, &registry()).unwrap().render(&Postgres);
        assert!(!sql.contains("50"));
        assert!(!sql.contains('\''));
        assert!(!sql.contains('%'));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_column_without_filter_is_not_searched() {
        let mut state = GridState::default();
        state.set_column_search(2, "ursula");
        assert!(run(&state).predicate().is_none());
    }

    #[test]
    fn test_global_search_only_touches_global_columns() {
        let mut state = GridState::default();
        state.set_global_search(Some("le guin".to_string()));
        let qb = run(&state);

        match qb.predicate() {
            Some(Predicate::Or(parts)) => {
                let fields: Vec<_> = parts
                    .iter()
                    .flat_map(|p| p.comparisons())
                    .map(|(field, _, _)| field.to_string())
                    .collect();
                assert_eq!(fields, vec!["_book.title", "author.name"]);
            }
            other => panic!("expected a disjunction, got {other:?}"),
        }
    }

    #[test]
    fn test_unresolvable_search_field_is_configuration_error() {
        let registry = registry();
        let columns = vec![
            Column::new(
                "publisher",
                0,
                "books",
                ColumnKind::text(),
                ColumnOptions::new().field("publisher.name").filter(Filter::new()),
            )
            .unwrap(),
        ];
        let mut state = GridState::default();
        state.set_column_search(0, "x");
        let ctx = ProcessContext {
            metadata: &registry,
            columns: &columns,
            state: &state,
        };
        let mut qb = base_query();
        assert!(matches!(
            SearchCriteriaProvider.process(&mut qb, &ctx),
            Err(GridError::Configuration(_))
        ));
    }
}
