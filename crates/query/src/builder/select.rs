//! Typestate builder for `Select` ASTs: columns first, then the root table,
//! then the optional clauses. `lower` assembles every statement through it.

use crate::ast::{
    common::{OrderDir, TableRef},
    expr::{BinaryOperator, Expr},
    select::{FromClause, JoinClause, OrderByExpr, Select},
};

#[derive(Debug, Default, Clone, Copy)]
pub struct Empty;

/// Columns are set, the root table is not.
#[derive(Debug, Default, Clone, Copy)]
pub struct Projected;

/// Root table is set; joins and filters may follow.
#[derive(Debug, Default, Clone, Copy)]
pub struct Rooted;

#[derive(Debug, Clone)]
pub struct SelectBuilder<State> {
    ast: Select,
    _state: State,
}

impl Default for SelectBuilder<Empty> {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectBuilder<Empty> {
    pub fn new() -> Self {
        Self {
            ast: Select::default(),
            _state: Empty,
        }
    }

    pub fn columns(mut self, columns: Vec<Expr>) -> SelectBuilder<Projected> {
        self.ast.columns = columns;
        SelectBuilder {
            ast: self.ast,
            _state: Projected,
        }
    }
}

impl SelectBuilder<Projected> {
    pub fn from(mut self, table: TableRef, alias: &str) -> SelectBuilder<Rooted> {
        self.ast.from = Some(FromClause {
            table,
            alias: Some(alias.to_string()),
        });
        SelectBuilder {
            ast: self.ast,
            _state: Rooted,
        }
    }
}

impl SelectBuilder<Rooted> {
    pub fn joins(mut self, joins: impl IntoIterator<Item = JoinClause>) -> Self {
        self.ast.joins.extend(joins);
        self
    }

    /// ANDs `condition` into the current filter.
    pub fn and_where(mut self, condition: Option<Expr>) -> Self {
        let Some(condition) = condition else {
            return self;
        };
        self.ast.where_clause = Some(match self.ast.where_clause.take() {
            Some(existing) => Expr::binary(existing, BinaryOperator::And, condition),
            None => condition,
        });
        self
    }

    pub fn group_by(mut self, exprs: impl IntoIterator<Item = Expr>) -> Self {
        self.ast.group_by.extend(exprs);
        self
    }

    pub fn order_by(mut self, expr: Expr, direction: OrderDir) -> Self {
        self.ast.order_by.push(OrderByExpr {
            expr,
            direction: Some(direction),
        });
        self
    }

    pub fn paginate(mut self, limit: Option<Expr>, offset: Option<Expr>) -> Self {
        self.ast.limit = limit;
        self.ast.offset = offset;
        self
    }

    pub fn build(self) -> Select {
        self.ast
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ast::common::JoinKind, qualified, table_ref, value};
    use model::core::value::Value;

    fn books() -> SelectBuilder<Rooted> {
        SelectBuilder::new()
            .columns(vec![qualified("_book", "id"), qualified("_book", "title")])
            .from(table_ref!("book"), "_book")
    }

    #[test]
    fn test_root_table_carries_alias() {
        let ast = books().build();
        let from = ast.from.unwrap();
        assert_eq!(from.table.name, "book");
        assert_eq!(from.alias.as_deref(), Some("_book"));
        assert!(ast.where_clause.is_none());
    }

    #[test]
    fn test_and_where_skips_missing_and_chains_present_conditions() {
        let long = Expr::binary(
            qualified("_book", "pages"),
            BinaryOperator::Gt,
            value(Value::Int(300)),
        );
        let named = Expr::binary(
            qualified("author", "name"),
            BinaryOperator::Eq,
            value(Value::from("Le Guin")),
        );

        let ast = books()
            .and_where(None)
            .and_where(Some(long.clone()))
            .and_where(Some(named.clone()))
            .build();

        assert_eq!(
            ast.where_clause,
            Some(Expr::binary(long, BinaryOperator::And, named))
        );
    }

    #[test]
    fn test_joins_ordering_and_paging() {
        let ast = books()
            .joins([JoinClause {
                kind: JoinKind::Left,
                table: table_ref!("author"),
                alias: Some("author".to_string()),
                on: Expr::binary(
                    qualified("_book", "author_id"),
                    BinaryOperator::Eq,
                    qualified("author", "id"),
                ),
            }])
            .order_by(qualified("_book", "title"), OrderDir::Desc)
            .paginate(Some(value(Value::Int(25))), None)
            .build();

        assert_eq!(ast.joins.len(), 1);
        assert_eq!(ast.order_by[0].direction, Some(OrderDir::Desc));
        assert_eq!(ast.limit, Some(value(Value::Int(25))));
        assert!(ast.offset.is_none());
    }
}
