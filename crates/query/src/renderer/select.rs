use crate::{
    ast::{
        common::{JoinKind, OrderDir, TableRef},
        select::{FromClause, JoinClause, OrderByExpr, Select},
    },
    renderer::{Render, Renderer},
};

impl Render for Select {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("SELECT ");
        r.list(&self.columns);

        if let Some(from) = &self.from {
            r.sql.push(' ');
            from.render(r);
        }
        for join in &self.joins {
            r.sql.push(' ');
            join.render(r);
        }
        if let Some(filter) = &self.where_clause {
            r.sql.push_str(" WHERE ");
            filter.render(r);
        }
        if !self.group_by.is_empty() {
            r.sql.push_str(" GROUP BY ");
            r.list(&self.group_by);
        }
        if !self.order_by.is_empty() {
            r.sql.push_str(" ORDER BY ");
            r.list(&self.order_by);
        }

        // Paging values are always bound, never inlined.
        if let Some(limit) = &self.limit {
            r.sql.push_str(" LIMIT ");
            limit.render(r);
        }
        if let Some(offset) = &self.offset {
            r.sql.push_str(" OFFSET ");
            offset.render(r);
        }
    }
}

impl Render for TableRef {
    fn render(&self, r: &mut Renderer) {
        if let Some(schema) = &self.schema {
            r.quoted(schema);
            r.sql.push('.');
        }
        r.quoted(&self.name);
    }
}

fn aliased_table(r: &mut Renderer, table: &TableRef, alias: Option<&str>) {
    table.render(r);
    if let Some(alias) = alias {
        r.sql.push_str(" AS ");
        r.quoted(alias);
    }
}

impl Render for FromClause {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("FROM ");
        aliased_table(r, &self.table, self.alias.as_deref());
    }
}

impl Render for JoinClause {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str(match self.kind {
            JoinKind::Inner => "INNER JOIN ",
            JoinKind::Left => "LEFT JOIN ",
        });
        aliased_table(r, &self.table, self.alias.as_deref());
        r.sql.push_str(" ON ");
        self.on.render(r);
    }
}

impl Render for OrderByExpr {
    fn render(&self, r: &mut Renderer) {
        self.expr.render(r);
        match self.direction {
            Some(OrderDir::Asc) => r.sql.push_str(" ASC"),
            Some(OrderDir::Desc) => r.sql.push_str(" DESC"),
            None => {}
        }
    }
}
