/// `table_ref!("book")` or `table_ref!("library", "book")`.
#[macro_export]
macro_rules! table_ref {
    ($name:expr) => {
        $crate::ast::common::TableRef {
            schema: None,
            name: $name.to_string(),
        }
    };
    ($schema:expr, $name:expr) => {
        $crate::ast::common::TableRef {
            schema: Some($schema.to_string()),
            name: $name.to_string(),
        }
    };
}

/// Selected column with a result label:
/// `ident_as!("_book", "title", "_book.title")` renders as
/// `"_book"."title" AS "_book.title"`.
#[macro_export]
macro_rules! ident_as {
    ($qualifier:expr, $name:expr, $label:expr) => {
        $crate::ast::expr::Expr::Alias {
            expr: Box::new($crate::ast::expr::Expr::Identifier(
                $crate::ast::expr::Ident {
                    qualifier: Some($qualifier.to_string()),
                    name: $name.to_string(),
                },
            )),
            alias: $label.to_string(),
        }
    };
}
