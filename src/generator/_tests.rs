#[cfg(test)]
pub mod fixtures {
    use crate::{
        config::Config,
        generate_sql,
        generator::GeneratedSql,
        tree::{Command, Expr, PrimitiveType, ResultType},
        Result,
    };

    pub fn people() -> Expr {
        Expr::scan("People", ResultType::row([
            ("Id", PrimitiveType::Int),
            ("Name", PrimitiveType::String),
            ("Age", PrimitiveType::Int),
            ("City", PrimitiveType::String),
        ]))
    }

    pub fn orders() -> Expr {
        Expr::scan("Orders", ResultType::row([
            ("Id", PrimitiveType::Int),
            ("PersonId", PrimitiveType::Int),
            ("ProductId", PrimitiveType::Int),
            ("Quantity", PrimitiveType::Int),
        ]))
    }

    pub fn products() -> Expr {
        Expr::scan("Products", ResultType::row([
            ("Id", PrimitiveType::Int),
            ("Name", PrimitiveType::String),
            ("Price", PrimitiveType::Decimal),
        ]))
    }

    pub fn try_generate(expr: Expr, config: &Config) -> Result<GeneratedSql> {
        generate_sql(&Command::Query(expr), config)
    }

    pub fn generate(expr: Expr) -> GeneratedSql {
        try_generate(expr, &Config::sql_server()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::fixtures::*;
    use crate::{
        config::{Config, Dialect},
        error::GenerationError,
        generate_sql,
        tree::{
            ArithmeticOp, Binding, Command, ComparisonOp, DeleteCommand, Expr, InsertCommand, JoinKind,
            ParameterBinding, SetClause, SetOpKind, SortKey, TableRef, UpdateCommand,
        },
    };

    fn p(name: &str) -> Expr {
        Expr::var("p").prop(name)
    }

    fn people_names() -> Expr {
        Expr::project(Binding::new("p", people()), vec![("Name", p("Name")), ("Age", p("Age"))])
    }

    #[test]
    fn test_project_over_single_extent() {
        let out = generate(people_names());
        assert_eq!(out.sql, "SELECT [People].[Name] AS [Name], [People].[Age] AS [Age]\nFROM [People] AS [People]");
        assert_eq!(out.columns, vec!["Name", "Age"]);
        assert!(!out.sql.contains("WHERE"));
    }

    #[test]
    fn test_self_join_suffixes_second_alias() {
        let join = Expr::join(
            JoinKind::Inner,
            Binding::new("a", people()),
            Binding::new("b", people()),
            Some(Expr::eq(Expr::var("a").prop("City"), Expr::var("b").prop("City"))),
        );
        let project = Expr::project(Binding::new("j", join), vec![
            ("Left", Expr::var("j").prop("a").prop("Name")),
            ("Right", Expr::var("j").prop("b").prop("Name")),
        ]);

        let out = generate(project);
        assert_eq!(
            out.sql,
            "SELECT [People].[Name] AS [Left], [People1].[Name] AS [Right]\n\
             FROM [People] AS [People]\n\
             INNER JOIN [People] AS [People1] ON [People].[City] = [People1].[City]"
        );
        assert_eq!(out.columns, vec!["Left", "Right"]);
    }

    #[test]
    fn test_filter_over_project_folds() {
        let filter = Expr::filter(
            Binding::new("q", people_names()),
            Expr::compare(ComparisonOp::Gt, Expr::var("q").prop("Age"), Expr::int(30)),
        );
        let out = generate(filter);
        assert_eq!(
            out.sql,
            "SELECT [People].[Name] AS [Name], [People].[Age] AS [Age]\n\
             FROM [People] AS [People]\n\
             WHERE [People].[Age] > 30"
        );
        assert_eq!(out.sql.matches("SELECT").count(), 1);
    }

    fn paged_people() -> Expr {
        let project = Expr::project(Binding::new("p", people()), vec![("Id", p("Id")), ("Name", p("Name"))]);
        let sort = Expr::sort(Binding::new("s", project), vec![SortKey::asc(Expr::var("s").prop("Name"))]);
        let limit = Expr::limit(Binding::new("l", sort), 10);
        Expr::skip(Binding::new("k", limit), 5)
    }

    #[test]
    fn test_skip_over_limit_renders_one_paging_clause() {
        let out = generate(paged_people());
        assert_eq!(
            out.sql,
            "SELECT [People].[Id] AS [Id], [People].[Name] AS [Name]\n\
             FROM [People] AS [People]\n\
             ORDER BY [People].[Name] ASC\n\
             OFFSET 5 ROWS FETCH NEXT 5 ROWS ONLY"
        );
    }

    #[test]
    fn test_skip_over_limit_with_limit_offset_dialect() {
        let out = try_generate(paged_people(), &Config::postgres()).unwrap();
        assert!(out.sql.ends_with("ORDER BY \"People\".\"Name\" ASC\nLIMIT 5 OFFSET 5"));
        assert_eq!(out.sql.matches("SELECT").count(), 1);
    }

    #[test]
    fn test_unreferenced_default_columns_are_elided() {
        let sort = Expr::sort(Binding::new("p", people()), vec![SortKey::asc(p("Name"))]);
        let limit = Expr::limit(Binding::new("p", sort), 3);
        let filter = Expr::filter(
            Binding::new("l", limit),
            Expr::compare(ComparisonOp::Gt, Expr::var("l").prop("Age"), Expr::int(30)),
        );
        let project = Expr::project(Binding::new("f", filter), vec![("Name", Expr::var("f").prop("Name"))]);

        let out = generate(project);
        assert_eq!(
            out.sql,
            "SELECT [l].[Name] AS [Name]\n\
             FROM (\n    \
                 SELECT TOP (3) [People].[Name] AS [Name], [People].[Age] AS [Age]\n    \
                 FROM [People] AS [People]\n    \
                 ORDER BY [People].[Name] ASC\n\
             ) AS [l]\n\
             WHERE [l].[Age] > 30"
        );
        assert!(!out.sql.contains("City"));
        assert!(!out.sql.contains(", ,"));
    }

    #[test]
    fn test_join_chain_is_flattened() {
        let inner = Expr::join(
            JoinKind::Inner,
            Binding::new("a", people()),
            Binding::new("b", orders()),
            Some(Expr::eq(Expr::var("a").prop("Id"), Expr::var("b").prop("PersonId"))),
        );
        let outer = Expr::join(
            JoinKind::Inner,
            Binding::new("ab", inner),
            Binding::new("c", products()),
            Some(Expr::eq(Expr::var("ab").prop("b").prop("ProductId"), Expr::var("c").prop("Id"))),
        );
        let project = Expr::project(Binding::new("j", outer), vec![
            ("Name", Expr::var("j").prop("ab").prop("a").prop("Name")),
            ("Product", Expr::var("j").prop("c").prop("Name")),
            ("Quantity", Expr::var("j").prop("ab").prop("b").prop("Quantity")),
        ]);

        let out = generate(project);
        assert_eq!(
            out.sql,
            "SELECT [People].[Name] AS [Name], [Products].[Name] AS [Product], [Orders].[Quantity] AS [Quantity]\n\
             FROM [People] AS [People]\n\
             INNER JOIN [Orders] AS [Orders] ON [People].[Id] = [Orders].[PersonId]\n\
             INNER JOIN [Products] AS [Products] ON [Orders].[ProductId] = [Products].[Id]"
        );
        assert_eq!(out.sql.matches("SELECT").count(), 1);
    }

    #[test]
    fn test_top_level_join_renames_repeated_columns() {
        let join = Expr::join(
            JoinKind::Inner,
            Binding::new("a", people()),
            Binding::new("b", orders()),
            Some(Expr::eq(Expr::var("a").prop("Id"), Expr::var("b").prop("PersonId"))),
        );
        let out = generate(join);
        assert_eq!(
            out.columns,
            vec!["Id", "Name", "Age", "City", "Id1", "PersonId", "ProductId", "Quantity"]
        );
        assert!(out.sql.contains("[Orders].[Id] AS [Id1]"));
    }

    #[test]
    fn test_three_way_self_join_suffixes_without_gaps() {
        let ab = Expr::join(JoinKind::Cross, Binding::new("a", people()), Binding::new("b", people()), None);
        let abc = Expr::join(JoinKind::Cross, Binding::new("ab", ab), Binding::new("c", people()), None);

        let out = generate(abc);
        assert!(out.sql.ends_with(
            "FROM [People] AS [People]\nCROSS JOIN [People] AS [People1]\nCROSS JOIN [People] AS [People2]"
        ));
        assert_eq!(out.columns, vec![
            "Id", "Name", "Age", "City",
            "Id1", "Name1", "Age1", "City1",
            "Id2", "Name2", "Age2", "City2",
        ]);
    }

    #[test]
    fn test_correlated_exists_renames_inner_extent() {
        let inner = Expr::filter(
            Binding::new("o", people()),
            Expr::eq(Expr::var("o").prop("Id"), p("Id")),
        );
        let filter = Expr::filter(Binding::new("p", people()), Expr::exists(inner));

        let out = generate(filter);
        assert!(out.sql.starts_with("SELECT [People].[Id] AS [Id], [People].[Name] AS [Name]"));
        assert!(out.sql.contains(
            "WHERE EXISTS (\n    \
                 SELECT 1 AS [C1]\n    \
                 FROM [People] AS [People1]\n    \
                 WHERE [People1].[Id] = [People].[Id]\n\
             )"
        ));
    }

    #[test]
    fn test_union_all_of_projections() {
        let left = Expr::project(Binding::new("p", people()), vec![("Name", p("Name"))]);
        let right = Expr::project(Binding::new("r", products()), vec![("Name", Expr::var("r").prop("Name"))]);

        let out = generate(Expr::set_operation(SetOpKind::UnionAll, left, right));
        assert_eq!(
            out.sql,
            "SELECT [UnionAll].[Name] AS [Name]\n\
             FROM (\n    \
                 SELECT [People].[Name] AS [Name]\n    \
                 FROM [People] AS [People]\n    \
                 UNION ALL\n    \
                 SELECT [Products].[Name] AS [Name]\n    \
                 FROM [Products] AS [Products]\n\
             ) AS [UnionAll]"
        );
        assert_eq!(out.columns, vec!["Name"]);
    }

    fn people_per_city() -> Expr {
        Expr::group_by(
            Binding::new("p", people()),
            vec![("City", p("City"))],
            vec![("Total", Expr::aggregate("COUNT", vec![]))],
        )
    }

    #[test]
    fn test_group_by_with_count() {
        let out = generate(people_per_city());
        assert_eq!(
            out.sql,
            "SELECT [People].[City] AS [City], COUNT(*) AS [Total]\n\
             FROM [People] AS [People]\n\
             GROUP BY [People].[City]"
        );
    }

    #[test]
    fn test_filter_over_group_by_wraps() {
        let filter = Expr::filter(
            Binding::new("g", people_per_city()),
            Expr::compare(ComparisonOp::Gt, Expr::var("g").prop("Total"), Expr::int(1)),
        );
        let out = generate(filter);
        assert_eq!(
            out.sql,
            "SELECT [g].[City] AS [City], [g].[Total] AS [Total]\n\
             FROM (\n    \
                 SELECT [People].[City] AS [City], COUNT(*) AS [Total]\n    \
                 FROM [People] AS [People]\n    \
                 GROUP BY [People].[City]\n\
             ) AS [g]\n\
             WHERE [g].[Total] > 1"
        );
        assert_eq!(out.columns, vec!["City", "Total"]);
    }

    #[test]
    fn test_filter_over_keyless_group_by_wraps() {
        let total = Expr::group_by(
            Binding::new("p", people()),
            Vec::<(&str, Expr)>::new(),
            vec![("Total", Expr::aggregate("COUNT", vec![]))],
        );
        let filter = Expr::filter(
            Binding::new("g", total),
            Expr::compare(ComparisonOp::Gt, Expr::var("g").prop("Total"), Expr::int(5)),
        );
        let out = generate(filter);
        assert_eq!(
            out.sql,
            "SELECT [g].[Total] AS [Total]\n\
             FROM (\n    \
                 SELECT COUNT(*) AS [Total]\n    \
                 FROM [People] AS [People]\n\
             ) AS [g]\n\
             WHERE [g].[Total] > 5"
        );
        assert!(!out.sql.contains("WHERE COUNT(*)"));
    }

    #[test]
    fn test_distinct_over_sorted_input_drops_inner_ordering() {
        let sort = Expr::sort(Binding::new("p", people()), vec![SortKey::asc(p("Age"))]);
        let project = Expr::project(Binding::new("s", sort), vec![("Name", Expr::var("s").prop("Name"))]);

        let out = try_generate(Expr::distinct(project), &Config::postgres()).unwrap();
        assert_eq!(
            out.sql,
            "SELECT DISTINCT \"Distinct\".\"Name\" AS \"Name\"\n\
             FROM (\n    \
                 SELECT \"People\".\"Name\" AS \"Name\"\n    \
                 FROM \"People\" AS \"People\"\n\
             ) AS \"Distinct\""
        );
        assert!(!out.sql.contains("ORDER BY"));
    }

    #[test]
    fn test_sort_over_sort_wraps_and_keeps_outer_ordering() {
        let inner = Expr::sort(Binding::new("p", people()), vec![SortKey::asc(p("Age"))]);
        let outer = Expr::sort(Binding::new("t", inner), vec![SortKey::asc(Expr::var("t").prop("Name"))]);

        let out = generate(outer);
        assert_eq!(out.sql.matches("SELECT").count(), 2);
        assert_eq!(out.sql.matches("ORDER BY").count(), 1);
        assert!(out.sql.ends_with(") AS [t]\nORDER BY [t].[Name] ASC"));
        assert!(!out.sql.contains("[People].[Age] ASC"));
    }

    #[test]
    fn test_limit_over_limit_wraps_and_keeps_inner_ordering() {
        let sort = Expr::sort(Binding::new("p", people()), vec![SortKey::asc(p("Age"))]);
        let inner = Expr::limit(Binding::new("a", sort), 10);
        let outer = Expr::limit(Binding::new("b", inner), 5);

        let out = generate(outer);
        assert_eq!(out.sql.matches("SELECT").count(), 2);
        assert!(out.sql.starts_with("SELECT TOP (5) [b].[Id] AS [Id]"));
        assert!(out.sql.contains("SELECT TOP (10) [People].[Id] AS [Id]"));
        assert!(out.sql.ends_with("\n    ORDER BY [People].[Age] ASC\n) AS [b]"));
    }

    #[test]
    fn test_skip_over_skip_wraps_and_keeps_inner_ordering() {
        let sort = Expr::sort(Binding::new("p", people()), vec![SortKey::asc(p("Age"))]);
        let inner = Expr::skip(Binding::new("a", sort), 10);
        let outer = Expr::skip(Binding::new("b", inner), 5);

        let out = try_generate(outer.clone(), &Config::postgres()).unwrap();
        assert_eq!(out.sql.matches("SELECT").count(), 2);
        assert!(out.sql.contains("ORDER BY \"People\".\"Age\" ASC\n    OFFSET 10\n) AS \"b\""));
        assert!(out.sql.ends_with(") AS \"b\"\nOFFSET 5"));

        // The wrapper has no ordering of its own for OFFSET ... ROWS.
        let err = try_generate(outer, &Config::sql_server()).unwrap_err();
        assert!(matches!(err, GenerationError::Unsupported { .. }));
    }

    #[test]
    fn test_cast_uses_dialect_type_names() {
        let cases = [
            (Dialect::sql_server(), "nvarchar(max)"),
            (Dialect::postgres(), "text"),
            (Dialect::sqlite(), "text"),
            (Dialect::mysql(), "char"),
        ];
        for (dialect, type_name) in cases {
            let cast = Expr::Cast { operand: Box::new(p("Id")), to: crate::tree::PrimitiveType::String };
            let project = Expr::project(Binding::new("p", people()), vec![("Code", cast)]);
            let out = try_generate(project, &Config::with_dialect(dialect)).unwrap();
            assert!(out.sql.contains(&format!(" AS {type_name}) AS ")), "{}", out.sql);
        }
    }

    #[test]
    fn test_distinct_projection() {
        let project = Expr::project(Binding::new("p", people()), vec![("City", p("City"))]);
        let out = generate(Expr::distinct(project));
        assert_eq!(out.sql, "SELECT DISTINCT [People].[City] AS [City]\nFROM [People] AS [People]");
    }

    #[test]
    fn test_skip_through_row_number_for_legacy_dialect() {
        let sort = Expr::sort(Binding::new("p", people()), vec![SortKey::asc(p("Name"))]);
        let skip = Expr::skip(Binding::new("k", sort), 5);
        let limit = Expr::limit(Binding::new("k", skip), 3);

        let out = try_generate(limit, &Config::with_dialect(Dialect::sql_server_legacy())).unwrap();
        assert_eq!(
            out.sql,
            "SELECT TOP (3) [k].[Id] AS [Id], [k].[Name] AS [Name], [k].[Age] AS [Age], [k].[City] AS [City]\n\
             FROM (\n    \
                 SELECT [People].[Id] AS [Id], [People].[Name] AS [Name], [People].[Age] AS [Age], [People].[City] AS [City], \
             ROW_NUMBER() OVER (ORDER BY [People].[Name] ASC) AS [row_number]\n    \
                 FROM [People] AS [People]\n\
             ) AS [k]\n\
             WHERE [k].[row_number] > 5\n\
             ORDER BY [k].[row_number]"
        );
        assert_eq!(out.columns, vec!["Id", "Name", "Age", "City"]);
    }

    #[test]
    fn test_limit_alone_per_dialect() {
        let limit = || Expr::limit(Binding::new("p", people_names()), 5);
        let ms = generate(limit());
        assert!(ms.sql.starts_with("SELECT TOP (5) [People].[Name] AS [Name]"));
        let pg = try_generate(limit(), &Config::postgres()).unwrap();
        assert!(pg.sql.ends_with("FROM \"People\" AS \"People\"\nLIMIT 5"));
    }

    #[test]
    fn test_with_ties_needs_top_syntax() {
        let sort = Expr::sort(Binding::new("p", people()), vec![SortKey::desc(p("Age"))]);
        let limit = Expr::Limit { input: Binding::new("s", sort), count: Box::new(Expr::int(3)), with_ties: true };

        let ms = try_generate(limit.clone(), &Config::sql_server()).unwrap();
        assert!(ms.sql.starts_with("SELECT TOP (3) WITH TIES "));
        let err = try_generate(limit, &Config::postgres()).unwrap_err();
        assert!(matches!(err, GenerationError::Unsupported { .. }));
    }

    #[test]
    fn test_sqlite_quotes_only_when_needed() {
        let scan = Expr::scan("people", crate::tree::ResultType::row([("name", crate::tree::PrimitiveType::String)]));
        let project = Expr::project(Binding::new("p", scan), vec![("order", Expr::var("p").prop("name"))]);
        let out = try_generate(project, &Config::sqlite()).unwrap();
        assert_eq!(out.sql, "SELECT people.name AS \"order\"\nFROM people AS people");
    }

    #[test]
    fn test_parameters_in_first_use_order() {
        let filter = Expr::filter(
            Binding::new("p", people_names()),
            Expr::and(
                Expr::compare(ComparisonOp::GtEq, p("Age"), Expr::param("min_age")),
                Expr::eq(p("Name"), Expr::param("name")),
            ),
        );
        let out = try_generate(filter, &Config::postgres()).unwrap();
        assert_eq!(out.parameters, vec!["min_age", "name"]);
        assert!(out.sql.ends_with("WHERE \"People\".\"Age\" >= :min_age AND \"People\".\"Name\" = :name"));
    }

    #[test]
    fn test_arithmetic_projection_is_parenthesized_when_inlined() {
        let project = Expr::project(Binding::new("p", people()), vec![
            ("NextAge", Expr::arithmetic(ArithmeticOp::Add, p("Age"), Expr::int(1))),
        ]);
        let filter = Expr::filter(
            Binding::new("q", project),
            Expr::compare(ComparisonOp::Lt, Expr::arithmetic(ArithmeticOp::Multiply, Expr::var("q").prop("NextAge"), Expr::int(2)), Expr::int(90)),
        );
        let out = generate(filter);
        assert!(out.sql.starts_with("SELECT [People].[Age] + 1 AS [NextAge]"));
        assert!(out.sql.ends_with("WHERE ([People].[Age] + 1) * 2 < 90"));
    }

    #[test]
    fn test_navigate_is_unsupported() {
        let filter = Expr::filter(
            Binding::new("p", people()),
            Expr::is_null(Expr::Navigate { instance: Box::new(Expr::var("p")), relationship: "Orders".into() }),
        );
        let err = try_generate(filter, &Config::sql_server()).unwrap_err();
        assert!(matches!(err, GenerationError::Unsupported { ref construct, .. } if construct.contains("Navigate")));
    }

    #[test]
    fn test_unbound_variable_fails_loudly() {
        let filter = Expr::filter(Binding::new("p", people()), Expr::eq(Expr::var("q").prop("Age"), Expr::int(1)));
        let err = try_generate(filter, &Config::sql_server()).unwrap_err();
        assert_eq!(err, GenerationError::binding("q"));
    }

    #[test]
    fn test_deep_tree_hits_nesting_limit() {
        let mut expr = people();
        for _ in 0..30 {
            expr = Expr::filter(Binding::new("p", expr), Expr::eq(p("Age"), Expr::int(1)));
        }
        let config = Config { max_nesting_depth: 10, ..Config::sql_server() };
        let err = try_generate(expr, &config).unwrap_err();
        assert_eq!(err, GenerationError::DepthExceeded { limit: 10 });
    }

    #[test]
    fn test_alias_exhaustion_is_reported() {
        let scan = || Expr::scan("A", crate::tree::ResultType::row([("Id", crate::tree::PrimitiveType::Int)]));
        let join = Expr::join(JoinKind::Cross, Binding::new("a", scan()), Binding::new("b", scan()), None);
        let config = Config::with_dialect(Dialect { max_identifier_length: 1, ..Dialect::sql_server() });
        let err = try_generate(join, &config).unwrap_err();
        assert_eq!(err, GenerationError::AliasExhausted { base: "A".into(), max_length: 1 });
    }

    #[test]
    fn test_query_from_json_tree() {
        let command: Command = serde_json::from_value(json!({
            "query": {
                "kind": "filter",
                "input": {
                    "var": "p",
                    "expr": {
                        "kind": "scan",
                        "schema": null,
                        "table": "People",
                        "row_type": { "row": { "Id": { "primitive": "int" }, "Age": { "primitive": "int" } } }
                    }
                },
                "predicate": {
                    "kind": "comparison",
                    "op": "gt",
                    "left": { "kind": "property", "instance": { "kind": "var_ref", "name": "p" }, "name": "Age" },
                    "right": { "kind": "constant", "value": { "int": 30 } }
                }
            }
        }))
        .unwrap();

        let out = generate_sql(&command, &Config::sql_server()).unwrap();
        assert_eq!(
            out.sql,
            "SELECT [People].[Id] AS [Id], [People].[Age] AS [Age]\n\
             FROM [People] AS [People]\n\
             WHERE [People].[Age] > 30"
        );
    }

    #[test]
    fn test_insert_with_output_and_returning() {
        let insert = Command::Insert(InsertCommand {
            target: TableRef::new("People"),
            values: vec![SetClause::new("Name", Expr::param("name")), SetClause::new("Age", Expr::int(30))],
            returning: vec!["Id".into()],
        });

        let ms = generate_sql(&insert, &Config::sql_server()).unwrap();
        assert_eq!(ms.sql, "INSERT INTO [People] ([Name], [Age])\nOUTPUT inserted.[Id]\nVALUES (@name, 30)");
        assert_eq!(ms.columns, vec!["Id"]);
        assert_eq!(ms.parameters, vec!["name"]);

        let pg = generate_sql(&insert, &Config::postgres()).unwrap();
        assert_eq!(pg.sql, "INSERT INTO \"People\" (\"Name\", \"Age\")\nVALUES (:name, 30)\nRETURNING \"Id\"");

        let err = generate_sql(&insert, &Config::with_dialect(Dialect::mysql())).unwrap_err();
        assert!(matches!(err, GenerationError::Unsupported { .. }));
    }

    #[test]
    fn test_update_with_parameter_bindings() {
        let update = Command::Update(UpdateCommand {
            target: Binding::new("p", people()),
            set: vec![SetClause::new("Age", Expr::arithmetic(ArithmeticOp::Add, p("Age"), Expr::int(1)))],
            predicate: Some(Expr::eq(p("Id"), Expr::param("id"))),
            parameter_bindings: vec![
                ParameterBinding::current("name", "Name"),
                ParameterBinding::original("old_city", "City"),
            ],
            returning: vec![],
        });

        let out = generate_sql(&update, &Config::sql_server()).unwrap();
        assert_eq!(
            out.sql,
            "UPDATE [People]\n\
             SET [Age] = [People].[Age] + 1, [Name] = @name\n\
             WHERE [People].[Id] = @id AND [People].[City] = @old_city"
        );
        assert_eq!(out.parameters, vec!["id", "name", "old_city"]);
    }

    #[test]
    fn test_update_duplicate_binding_prefers_current_value() {
        let update = Command::Update(UpdateCommand {
            target: Binding::new("p", people()),
            set: vec![],
            predicate: None,
            parameter_bindings: vec![
                ParameterBinding::original("old_name", "Name"),
                ParameterBinding::current("new_name", "Name"),
            ],
            returning: vec![],
        });
        let out = generate_sql(&update, &Config::sql_server()).unwrap();
        assert_eq!(out.sql, "UPDATE [People]\nSET [Name] = @new_name");
        assert_eq!(out.parameters, vec!["new_name"]);
    }

    #[test]
    fn test_delete_with_concurrency_check() {
        let delete = Command::Delete(DeleteCommand {
            target: Binding::new("p", people()),
            predicate: Some(Expr::compare(ComparisonOp::Lt, p("Age"), Expr::int(18))),
            parameter_bindings: vec![ParameterBinding::original("id", "Id")],
        });
        let out = generate_sql(&delete, &Config::sql_server()).unwrap();
        assert_eq!(out.sql, "DELETE FROM [People]\nWHERE [People].[Age] < 18 AND [People].[Id] = @id");
        assert!(out.columns.is_empty());
    }

    #[test]
    fn test_update_of_unknown_column_fails() {
        let update = Command::Update(UpdateCommand {
            target: Binding::new("p", people()),
            set: vec![SetClause::new("Salary", Expr::int(1))],
            predicate: None,
            parameter_bindings: vec![],
            returning: vec![],
        });
        let err = generate_sql(&update, &Config::sql_server()).unwrap_err();
        assert_eq!(err, GenerationError::unknown_member("People", "Salary"));
    }
}
