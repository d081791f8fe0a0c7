#![allow(dead_code)]

use std::sync::Arc;

use sqlforge_core::{
    GenericDialect, MysqlDialect, PostgresDialect, Query, QueryBuilder, SqlValue, SqliteDialect,
    Statement,
};

pub fn generic() -> QueryBuilder {
    QueryBuilder::new(Arc::new(GenericDialect::new()))
}

pub fn sqlite() -> QueryBuilder {
    QueryBuilder::new(Arc::new(SqliteDialect::new()))
}

pub fn postgres() -> QueryBuilder {
    QueryBuilder::new(Arc::new(PostgresDialect::new()))
}

pub fn mysql() -> QueryBuilder {
    QueryBuilder::new(Arc::new(MysqlDialect::new()))
}

pub fn build(builder: &QueryBuilder, query: &Query) -> Statement {
    builder
        .build_query(query)
        .unwrap_or_else(|e| panic!("Failed to build {query:?}\nError: {e}"))
}

pub fn param(stmt: &Statement, name: &str) -> SqlValue {
    stmt.params
        .get(name)
        .unwrap_or_else(|| panic!("Missing parameter {name} in {:?}", stmt.params))
        .value()
        .clone()
}
