//! # sqlforge-core
//!
//! Builds parameterized SQL from structured descriptions.
//!
//! This crate provides:
//! - A typed parameter model and a placeholder scanner for raw SQL
//! - Condition trees with a filter transform that drops blank leaves
//! - A SELECT description with joins, grouping, unions and CTEs
//! - INSERT / batch INSERT / UPDATE / DELETE / UPSERT and DDL builders
//! - Dialects for SQLite, PostgreSQL and MySQL behind one [`Dialect`] trait
//!
//! Every scalar goes through a bound parameter, except in batch inserts,
//! where scalars are inlined as escaped literals to stay under the
//! bound-parameter limit.
//!
//! ```rust
//! use std::sync::Arc;
//! use sqlforge_core::{Condition, Query, QueryBuilder, SqliteDialect};
//!
//! let builder = QueryBuilder::new(Arc::new(SqliteDialect::new()));
//! let query = Query::new()
//!     .select(["id", "name"])
//!     .from("user")
//!     .where_clause(Condition::eq("status", "active"))
//!     .limit(10);
//! let stmt = builder.build_query(&query).unwrap();
//!
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT \"id\", \"name\" FROM \"user\" WHERE \"status\" = :qp0 LIMIT 10"
//! );
//! assert_eq!(stmt.params.len(), 1);
//! ```

pub mod batch;
pub mod builder;
pub mod column;
pub mod condition;
pub mod dialect;
pub mod error;
pub mod expression;
pub mod param;
pub mod query;
pub mod raw_sql;
pub mod scanner;

pub use batch::plan_chunks;
pub use builder::{ForeignKey, InsertSource, QueryBuilder, Statement, UpsertUpdate, ViewSource};
pub use column::{
    ColumnBuilder, ColumnDefinition, ColumnType, DataType, ForeignKeyAction, TypeNames,
};
pub use condition::{CompareOp, Condition, ConditionValue, Conjunction};
pub use dialect::{
    quote_sql, ConstraintKind, Dialect, GenericDialect, MysqlDialect, PostgresDialect,
    SqliteDialect, UpsertStyle,
};
pub use error::{BuildError, Result};
pub use expression::{BuildExpression, CaseExpression, Expression, Operand, Value};
pub use param::{LobStream, Param, ParamKey, ParamType, Params, SqlValue, ToSqlValue};
pub use query::{Direction, JoinKind, Query};
pub use raw_sql::raw_sql;
pub use scanner::{next_placeholder, string_literal_spans, Placeholder, PlaceholderScanner};
