//! Statement builder.
//!
//! [`QueryBuilder`] turns structured descriptions into SQL text plus the
//! [`Params`] bound to it. Every identifier and literal goes through the
//! builder's [`Dialect`], so the same description renders for any database.
//!
//! The builder is split by concern:
//!
//! - `expression`: expression kinds, values and operands
//! - `condition`: condition trees
//! - `dql`: SELECT queries
//! - `dml`: INSERT, batch INSERT, UPDATE, DELETE, UPSERT
//! - `ddl`: CREATE / ALTER / DROP statements

mod condition;
mod ddl;
mod dml;
mod dql;
mod expression;

use std::sync::Arc;

pub use ddl::{ForeignKey, ViewSource};
pub use dml::{InsertSource, UpsertUpdate};

use crate::dialect::{quote_sql, Dialect};
use crate::param::Params;

/// A built statement: SQL text, its parameters, and the table whose cached
/// schema becomes stale once the statement runs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    /// SQL text.
    pub sql: String,
    /// Bound parameters.
    pub params: Params,
    /// Table to refresh in the schema cache after execution.
    pub refresh_table: Option<String>,
}

impl Statement {
    /// Creates a statement without schema side effects.
    #[must_use]
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
            refresh_table: None,
        }
    }

    /// Marks `table` for a schema refresh after execution.
    #[must_use]
    pub fn refreshing(mut self, table: impl Into<String>) -> Self {
        self.refresh_table = Some(table.into());
        self
    }
}

/// Renders queries and statements for one dialect.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    dialect: Arc<dyn Dialect>,
    table_prefix: String,
}

impl QueryBuilder {
    /// Creates a builder for `dialect` with no table prefix.
    #[must_use]
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            table_prefix: String::new(),
        }
    }

    /// Sets the prefix substituted for `%` in `{{%table}}` markers.
    #[must_use]
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Returns a shared handle to the dialect.
    #[must_use]
    pub fn dialect_arc(&self) -> Arc<dyn Dialect> {
        Arc::clone(&self.dialect)
    }

    /// Returns the table prefix.
    #[must_use]
    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    /// Quotes a table name.
    #[must_use]
    pub fn quote_table(&self, name: &str) -> String {
        self.dialect.quote_table_name(name)
    }

    /// Quotes a column name.
    #[must_use]
    pub fn quote_column(&self, name: &str) -> String {
        self.dialect.quote_column_name(name)
    }

    /// Quotes a string literal.
    #[must_use]
    pub fn quote_value(&self, value: &str) -> String {
        self.dialect.quote_value(value)
    }

    /// Rewrites `{{table}}` and `[[column]]` markers.
    #[must_use]
    pub fn quote_sql(&self, sql: &str) -> String {
        quote_sql(self.dialect.as_ref(), sql, &self.table_prefix)
    }

    fn quote_columns<S: AsRef<str>>(&self, columns: &[S]) -> String {
        columns
            .iter()
            .map(|c| self.quote_column(c.as_ref()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Finishes a statement: resolves shorthand markers.
    fn statement(&self, sql: &str, params: Params) -> Statement {
        Statement::new(self.quote_sql(sql), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{GenericDialect, MysqlDialect};

    #[test]
    fn test_statement_resolves_markers() {
        let qb = QueryBuilder::new(Arc::new(MysqlDialect::new())).with_table_prefix("app_");
        let stmt = qb.statement("SELECT [[id]] FROM {{%user}}", Params::new());
        assert_eq!(stmt.sql, "SELECT `id` FROM `app_user`");
        assert_eq!(stmt.refresh_table, None);
    }

    #[test]
    fn test_quote_columns() {
        let qb = QueryBuilder::new(Arc::new(GenericDialect::new()));
        assert_eq!(qb.quote_columns(&["a", "t.b"]), "\"a\", \"t\".\"b\"");
    }
}
