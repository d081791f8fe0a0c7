//! Tests for SELECT building: clause order, sub-queries, unions, filter
//! conditions, paging per dialect and shorthand markers.

mod common;
use common::*;

use sqlforge_core::{CaseExpression, Condition, Expression, JoinKind, Query, SqlValue};

#[test]
fn exists_sub_query_keeps_parameter_order() {
    let comments = Query::new()
        .select_expr(Expression::raw("1"))
        .from("comment c")
        .where_clause(Condition::and([
            Condition::raw("c.post_id = p.id"),
            Condition::eq("c.approved", true),
        ]));
    let query = Query::new()
        .select(["p.id"])
        .from("post p")
        .where_clause(Condition::eq("p.status", 2))
        .and_where(Condition::exists(comments));
    let stmt = build(&generic(), &query);
    assert_eq!(
        stmt.sql,
        "SELECT \"p\".\"id\" FROM \"post\" \"p\" WHERE (\"p\".\"status\" = :qp0) AND \
         (EXISTS (SELECT 1 FROM \"comment\" \"c\" WHERE (c.post_id = p.id) AND (\"c\".\"approved\" = :qp1)))"
    );
    assert_eq!(param(&stmt, ":qp0"), SqlValue::Int(2));
    assert_eq!(param(&stmt, ":qp1"), SqlValue::Bool(true));
}

#[test]
fn union_all_threads_parameters() {
    let query = Query::new()
        .select(["id"])
        .from("a")
        .where_clause(Condition::gt("x", 1))
        .union_all(
            Query::new()
                .select(["id"])
                .from("b")
                .where_clause(Condition::lt("y", 2)),
        );
    let stmt = build(&generic(), &query);
    assert_eq!(
        stmt.sql,
        "(SELECT \"id\" FROM \"a\" WHERE \"x\" > :qp0) UNION ALL (SELECT \"id\" FROM \"b\" WHERE \"y\" < :qp1)"
    );
    assert_eq!(stmt.params.len(), 2);
}

#[test]
fn grouping_having_and_ordering() {
    let query = Query::new()
        .select(["author_id", "COUNT(*) AS total"])
        .from("post")
        .group_by("author_id")
        .having(Condition::gt("COUNT(*)", 5))
        .order_by("total DESC, author_id");
    assert_eq!(
        build(&generic(), &query).sql,
        "SELECT \"author_id\", COUNT(*) AS total FROM \"post\" GROUP BY \"author_id\" \
         HAVING COUNT(*) > :qp0 ORDER BY \"total\" DESC, \"author_id\""
    );
}

#[test]
fn joins_with_sub_query_source() {
    let totals = Query::new()
        .select(["user_id", "COUNT(*) AS total"])
        .from("post")
        .group_by("user_id");
    let query = Query::new()
        .select(["u.name", "s.total"])
        .from("user u")
        .left_join("profile p", Condition::raw("p.user_id = u.id"))
        .join_source(JoinKind::Inner, "s", totals, Condition::raw("s.user_id = u.id"));
    assert_eq!(
        build(&generic(), &query).sql,
        "SELECT \"u\".\"name\", \"s\".\"total\" FROM \"user\" \"u\" \
         LEFT JOIN \"profile\" \"p\" ON p.user_id = u.id \
         INNER JOIN (SELECT \"user_id\", COUNT(*) AS total FROM \"post\" GROUP BY \"user_id\") \"s\" \
         ON s.user_id = u.id"
    );
}

#[test]
fn filter_where_with_only_blank_values_has_no_where() {
    let query = Query::new()
        .from("user")
        .filter_where(&Condition::hash([("name", ""), ("status", "  ")]));
    assert_eq!(build(&generic(), &query).sql, "SELECT * FROM \"user\"");
}

#[test]
fn filter_where_keeps_non_blank_leaves() {
    let query = Query::new().from("user").filter_where(&Condition::and([
        Condition::eq("name", "ann"),
        Condition::in_list("id", Vec::<i64>::new()),
    ]));
    let stmt = build(&generic(), &query);
    assert_eq!(stmt.sql, "SELECT * FROM \"user\" WHERE \"name\" = :qp0");
    assert_eq!(param(&stmt, ":qp0"), SqlValue::Text("ann".into()));
}

#[test]
fn offset_without_limit_per_dialect() {
    let query = Query::new().from("post").offset(20);
    assert_eq!(build(&generic(), &query).sql, "SELECT * FROM \"post\" OFFSET 20");
    assert_eq!(
        build(&sqlite(), &query).sql,
        "SELECT * FROM \"post\" LIMIT -1 OFFSET 20"
    );
    assert_eq!(
        build(&mysql(), &query).sql,
        "SELECT * FROM `post` LIMIT 18446744073709551615 OFFSET 20"
    );
}

#[test]
fn shorthand_markers_use_table_prefix() {
    let query = Query::new().select(["[[id]]"]).from("{{%user}}");
    let stmt = build(&postgres().with_table_prefix("tbl_"), &query);
    assert_eq!(stmt.sql, "SELECT \"id\" FROM \"tbl_user\"");
}

#[test]
fn case_expression_in_select_list() {
    let case = CaseExpression::new()
        .when(Expression::from(Condition::gt("score", 90)), "A")
        .otherwise("B");
    let query = Query::new()
        .select_as("label", Expression::from(case))
        .from("result");
    let stmt = build(&generic(), &query);
    assert_eq!(
        stmt.sql,
        "SELECT CASE WHEN \"score\" > :qp0 THEN :qp1 ELSE :qp2 END AS \"label\" FROM \"result\""
    );
    assert_eq!(param(&stmt, ":qp2"), SqlValue::Text("B".into()));
}

#[test]
fn sub_query_source_without_alias_fails() {
    let query = Query::new().from_source(Query::new().from("t"));
    assert!(generic().build_query(&query).is_err());
}
