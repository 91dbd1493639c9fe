//! The one statement shape the grid issues: a projection over a root entity
//! table, its relation joins, an optional filter, and paging.

use crate::ast::{
    common::{JoinKind, OrderDir, TableRef},
    expr::Expr,
};

/// Built through `SelectBuilder`. Count statements use the same shape with a
/// single `COUNT(..)` column.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Select {
    pub columns: Vec<Expr>,
    pub from: Option<FromClause>,
    /// Relation joins in the order their aliases were registered.
    pub joins: Vec<JoinClause>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub order_by: Vec<OrderByExpr>,
    /// Bound as parameters, never inlined.
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
}

/// Root entity table, e.g. `"book" AS "_book"`.
#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub table: TableRef,
    pub alias: Option<String>,
}

/// One hop along a relation path, e.g. `"_book"."author_id" = "author"."id"`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: TableRef,
    pub alias: Option<String>,
    pub on: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub direction: Option<OrderDir>,
}
