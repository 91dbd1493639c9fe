use crate::{
    ast::expr::{BinaryOp, BinaryOperator, Expr, FunctionCall, Ident},
    renderer::{Render, Renderer},
};

impl Render for Expr {
    fn render(&self, r: &mut Renderer) {
        match self {
            Expr::Identifier(ident) => ident.render(r),
            Expr::Value(val) => r.add_param(val.clone()),
            Expr::BinaryOp(op) => op.render(r),
            Expr::Like { expr, pattern } => {
                r.sql.push('(');
                expr.render(r);
                r.sql.push_str(" LIKE ");
                pattern.render(r);
                r.sql.push(')');
            }
            Expr::TextCast(expr) => {
                r.sql.push_str("CAST(");
                expr.render(r);
                r.sql.push_str(" AS ");
                r.sql.push_str(r.dialect.text_cast_type());
                r.sql.push(')');
            }
            Expr::FunctionCall(func) => func.render(r),
            Expr::Alias { expr, alias } => {
                expr.render(r);
                r.sql.push_str(" AS ");
                r.quoted(alias);
            }
        }
    }
}

impl Render for Ident {
    fn render(&self, r: &mut Renderer) {
        if let Some(qualifier) = &self.qualifier {
            r.quoted(qualifier);
            r.sql.push('.');
        }
        r.quoted(&self.name);
    }
}

impl Render for BinaryOp {
    fn render(&self, r: &mut Renderer) {
        r.sql.push('(');
        self.left.render(r);

        let op_str = match self.op {
            BinaryOperator::Eq => " = ",
            BinaryOperator::NotEq => " <> ",
            BinaryOperator::Lt => " < ",
            BinaryOperator::LtEq => " <= ",
            BinaryOperator::Gt => " > ",
            BinaryOperator::GtEq => " >= ",
            BinaryOperator::And => " AND ",
            BinaryOperator::Or => " OR ",
        };
        r.sql.push_str(op_str);

        self.right.render(r);
        r.sql.push(')');
    }
}

impl Render for FunctionCall {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str(&self.name);
        r.sql.push('(');
        if self.distinct {
            r.sql.push_str("DISTINCT ");
        }
        if self.wildcard {
            r.sql.push('*');
        } else {
            r.list(&self.args);
        }
        r.sql.push(')');
    }
}
