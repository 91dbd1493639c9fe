#[cfg(test)]
mod tests {
    use crate::{RecordingExecutor, library};
    use grid::{
        backend::SqlQuery, definition::TableDefinition, error::GridError, factory::GridFactory,
        table::DataTable,
    };
    use model::{core::value::Value, records::row::RowData};
    use serde_json::{Value as JsonValue, json};
    use std::sync::Arc;
    use tracing_test::traced_test;

    const BOOKS: &str = r#"{
        "name": "books",
        "entity": "App\\Entity\\Book",
        "columns": [
            {"name": "id", "kind": "text", "hidden": true, "globalSearchable": false},
            {"name": "author", "kind": "text", "field": "author.name", "filter": {}},
            {"name": "title", "kind": "text", "filter": {}}
        ],
        "order": [{"column": "title"}]
    }"#;

    const CATALOG: &str = r#"{
        "name": "catalog",
        "entity": "Book",
        "columns": [
            {"name": "id", "kind": "text", "hidden": true, "globalSearchable": false},
            {"name": "title", "kind": "text"},
            {"name": "author", "kind": "text", "field": "author.name"},
            {"name": "pages", "kind": "text", "globalSearchable": false, "filter": {"operator": ">="}}
        ]
    }"#;

    const STAFF: &str = r#"{
        "name": "staff",
        "entity": "Employee",
        "columns": [
            {"name": "id", "kind": "text", "hidden": true},
            {"name": "name", "kind": "text"},
            {"name": "department", "kind": "text", "field": "department.title"},
            {"name": "manager", "kind": "text", "field": "department.manager.name"}
        ]
    }"#;

    fn build(definition: &str, executor: Arc<RecordingExecutor>) -> DataTable {
        TableDefinition::from_json(definition)
            .unwrap()
            .build(&GridFactory::default(), Arc::new(library()), executor)
            .unwrap()
    }

    fn book(id: i64, title: &str, author_id: i64, author: &str) -> RowData {
        RowData::from_pairs([
            ("_book.id", Value::Int(id)),
            ("_book.title", Value::from(title)),
            ("author.id", Value::Int(author_id)),
            ("author.name", Value::from(author)),
        ])
    }

    /// The data statement is always the last one run.
    fn data_query(executor: &RecordingExecutor) -> SqlQuery {
        executor.queries().pop().unwrap()
    }

    fn where_clause(sql: &str) -> &str {
        let start = sql.find(" WHERE ").unwrap();
        let end = sql.find(" ORDER BY ").or_else(|| sql.find(" LIMIT ")).unwrap_or(sql.len());
        &sql[start..end]
    }

    #[traced_test]
    #[tokio::test]
    async fn test_draw_joins_author_once_and_projects_partially() {
        let executor = RecordingExecutor::new(
            2,
            vec![book(1, "Dune", 7, "Frank Herbert"), book(2, "Emma", 8, "Jane Austen")],
        );
        let mut table = build(BOOKS, executor.clone());

        let response = table
            .handle_request(
                &json!({
                    "_dt": "books",
                    "draw": "3",
                    "start": "0",
                    "length": "10",
                    "columns": {"1": {"search": {"value": "foo"}}}
                }),
                None,
            )
            .unwrap()
            .get_response()
            .await
            .unwrap();

        let queries = executor.queries();
        assert_eq!(queries.len(), 3, "total, filtered and data statements");

        let data = data_query(&executor);
        assert_eq!(
            data.labels,
            vec!["_book.id", "_book.title", "author.id", "author.name"]
        );
        assert_eq!(data.sql.matches("LEFT JOIN").count(), 1);
        assert!(data.sql.contains(
            r#"LEFT JOIN "author" AS "author" ON ("_book"."author_id" = "author"."id")"#
        ));
        assert!(data.sql.contains(r#"("_book"."title" LIKE $1)"#));
        assert_eq!(data.params[0], Value::String("%foo%".to_string()));
        assert!(data.sql.contains(r#"ORDER BY "_book"."title" ASC"#));

        assert_eq!(response.draw, 3);
        assert_eq!(response.records_total, 2);
        assert_eq!(response.records_filtered, 2);
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[0]["DT_RowId"], json!(1));
        assert_eq!(response.data[0]["author"], json!("Frank Herbert"));
        assert_eq!(response.data[1]["title"], json!("Emma"));
        assert!(response.initial.is_none());
        assert!(logs_contain("Served grid data"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_unfiltered_draw_counts_once() {
        let executor = RecordingExecutor::new(5, Vec::new());
        let mut table = build(BOOKS, executor.clone());

        let response = table
            .handle_request(&json!({"_dt": "books", "draw": "1"}), None)
            .unwrap()
            .get_response()
            .await
            .unwrap();

        assert_eq!(executor.queries().len(), 2);
        assert_eq!(response.records_total, 5);
        assert_eq!(response.records_filtered, 5);
        assert!(response.data.is_empty());
        assert!(!data_query(&executor).sql.contains(" WHERE "));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_nested_path_joins_each_association_once() {
        let executor = RecordingExecutor::new(
            1,
            vec![RowData::from_pairs([
                ("_employee.id", Value::Int(3)),
                ("_employee.name", Value::from("Ada")),
                ("department.id", Value::Int(1)),
                ("department.title", Value::from("Research")),
                ("department_manager.id", Value::Int(9)),
                ("department_manager.name", Value::from("Grace")),
            ])],
        );
        let mut table = build(STAFF, executor.clone());

        let response = table
            .handle_request(&json!({"_dt": "staff", "draw": "1"}), None)
            .unwrap()
            .get_response()
            .await
            .unwrap();

        let data = data_query(&executor);
        assert_eq!(data.sql.matches("LEFT JOIN").count(), 2);
        assert!(data.sql.contains(
            r#"LEFT JOIN "department" AS "department" ON ("_employee"."department_id" = "department"."id")"#
        ));
        assert!(data.sql.contains(
            r#"LEFT JOIN "employee" AS "department_manager" ON ("department"."manager_id" = "department_manager"."id")"#
        ));

        assert_eq!(response.data[0]["name"], json!("Ada"));
        assert_eq!(response.data[0]["department"], json!("Research"));
        assert_eq!(response.data[0]["manager"], json!("Grace"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_search_terms_only_travel_as_parameters() {
        let executor = RecordingExecutor::empty();
        let mut table = build(BOOKS, executor.clone());

        table
            .handle_request(
                &json!({
                    "_dt": "books",
                    "draw": "2",
                    "search": {"value": "x'; DROP TABLE book; --"},
                    "columns": {"1": {"search": {"value": "50%_o'k"}}}
                }),
                None,
            )
            .unwrap()
            .get_response()
            .await
            .unwrap();

        for query in executor.queries() {
            assert!(!query.sql.contains('\''), "{}", query.sql);
            assert!(!query.sql.contains('%'), "{}", query.sql);
            assert!(!query.sql.contains("DROP"), "{}", query.sql);
            assert!(!query.sql.contains("50"), "{}", query.sql);
        }
        let data = data_query(&executor);
        assert!(data.params.contains(&Value::String(r"%50\%\_o'k%".to_string())));
        assert!(data.params.contains(&Value::String("%x'; DROP TABLE book; --%".to_string())));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_global_search_covers_global_columns_only() {
        let executor = RecordingExecutor::empty();
        let mut table = build(CATALOG, executor.clone());

        table
            .handle_request(
                &json!({"_dt": "catalog", "draw": "1", "search": {"value": "dune"}}),
                None,
            )
            .unwrap()
            .get_response()
            .await
            .unwrap();

        let data = data_query(&executor);
        let filter = where_clause(&data.sql);
        assert!(filter.contains(r#"("_book"."title" LIKE $1) OR ("author"."name" LIKE $2)"#), "{filter}");
        assert!(!filter.contains(r#""pages""#));
        assert!(!filter.contains(r#""id""#));
        assert_eq!(&data.params[..2], &[Value::from("%dune%"), Value::from("%dune%")]);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_numeric_filter_binds_a_number() {
        let executor = RecordingExecutor::empty();
        let mut table = build(CATALOG, executor.clone());

        table
            .handle_request(
                &json!({"_dt": "catalog", "draw": "1", "columns": {"2": {"search": {"value": "300"}}}}),
                None,
            )
            .unwrap()
            .get_response()
            .await
            .unwrap();

        let data = data_query(&executor);
        assert!(where_clause(&data.sql).contains(r#""_book"."pages" >= $1"#));
        assert_eq!(data.params[0], Value::Int(300));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_first_draw_carries_initial_configuration() {
        let mut table = build(BOOKS, RecordingExecutor::empty());

        let response = table
            .handle_request(&json!({"_dt": "books", "_init": "1", "draw": "1"}), None)
            .unwrap()
            .get_response()
            .await
            .unwrap();

        let initial = response.initial.unwrap();
        let columns = initial.options["columns"].as_array().unwrap();
        let names: Vec<_> = columns.iter().map(|c| c["data"].clone()).collect();
        assert_eq!(names, vec![json!("author"), json!("title")]);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_requests_for_other_tables_are_ignored() {
        let mut table = build(BOOKS, RecordingExecutor::empty());
        table
            .handle_request(&json!({"_dt": "authors", "draw": "1"}), None)
            .unwrap();

        assert!(!table.is_callback());
        assert!(matches!(
            table.get_response().await,
            Err(GridError::InvalidState(_))
        ));
    }

    #[test]
    fn test_order_on_unknown_column_is_rejected() {
        let mut table = build(BOOKS, RecordingExecutor::empty());
        let params: JsonValue = json!({"_dt": "books", "order": {"0": {"column": "9", "dir": "asc"}}});
        assert!(table.handle_request(&params, None).is_err());
    }
}
