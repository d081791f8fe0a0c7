//! SQL Dialect support.
//!
//! Different databases have slightly different SQL syntax. Every builder in
//! this crate quotes identifiers and literals through the [`Dialect`] trait,
//! so switching databases means switching the dialect and nothing else.

mod generic;
mod mysql;
mod postgres;
mod sqlite;

use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};

pub use generic::GenericDialect;
pub use mysql::MysqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::column::{DataType, TypeNames};
use crate::error::{BuildError, Result};
use crate::param::SqlValue;
use crate::scanner::string_literal_spans;

/// How a dialect spells INSERT-or-update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertStyle {
    /// `INSERT ... ON CONFLICT (...) DO UPDATE SET ...` (PostgreSQL, SQLite).
    OnConflict,
    /// `INSERT ... ON DUPLICATE KEY UPDATE ...` (MySQL).
    OnDuplicateKey,
    /// No upsert syntax.
    Unsupported,
}

/// Named table constraint kinds, used when dropping them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// PRIMARY KEY.
    PrimaryKey,
    /// FOREIGN KEY.
    ForeignKey,
    /// UNIQUE.
    Unique,
    /// CHECK.
    Check,
}

/// Trait for SQL dialect-specific behavior.
///
/// The DDL hooks receive identifiers that are already quoted.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the opening and closing identifier quote characters.
    fn identifier_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    /// Quotes a table name that has no schema prefix.
    fn quote_simple_table_name(&self, name: &str) -> String {
        let (open, close) = self.identifier_quotes();
        if name.starts_with(open) {
            return String::from(name);
        }
        let escaped = name.replace(close, &format!("{close}{close}"));
        format!("{open}{escaped}{close}")
    }

    /// Quotes a column name that has no table prefix. `*` is left alone.
    fn quote_simple_column_name(&self, name: &str) -> String {
        if name == "*" {
            return String::from(name);
        }
        self.quote_simple_table_name(name)
    }

    /// Quotes a possibly schema-qualified table name.
    ///
    /// Names containing `(` (sub-queries, functions) or `{{` markers are
    /// returned unchanged.
    fn quote_table_name(&self, name: &str) -> String {
        if name.contains('(') || name.contains("{{") {
            return String::from(name);
        }
        name.split('.')
            .map(|part| self.quote_simple_table_name(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quotes a possibly table-qualified column name.
    ///
    /// Names containing `(`, `[[` or `{{` are returned unchanged.
    fn quote_column_name(&self, name: &str) -> String {
        if name.contains('(') || name.contains("[[") || name.contains("{{") {
            return String::from(name);
        }
        match name.rfind('.') {
            Some(pos) => format!(
                "{}.{}",
                self.quote_table_name(&name[..pos]),
                self.quote_simple_column_name(&name[pos + 1..])
            ),
            None => self.quote_simple_column_name(name),
        }
    }

    /// Quotes a string as a SQL literal, escaping single quotes by doubling.
    fn quote_value(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Renders a binary literal.
    fn blob_literal(&self, bytes: &[u8]) -> String {
        let hex: String = bytes.iter().map(|byte| format!("{byte:02X}")).collect();
        format!("X'{hex}'")
    }

    /// Renders a value as an inline SQL literal.
    ///
    /// Returns `None` for streams, whose contents cannot be inlined.
    fn literal(&self, value: &SqlValue) -> Option<String> {
        let sql = match value {
            SqlValue::Null => String::from("NULL"),
            SqlValue::Bool(true) => String::from("TRUE"),
            SqlValue::Bool(false) => String::from("FALSE"),
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Text(s) => self.quote_value(s),
            SqlValue::Blob(b) => self.blob_literal(b),
            SqlValue::Stream(_) => return None,
        };
        Some(sql)
    }

    /// Returns whether `$tag$ ... $tag$` strings exist in this dialect.
    fn supports_dollar_quoting(&self) -> bool {
        false
    }

    /// Returns the maximum number of bound parameters per statement.
    fn max_bound_params(&self) -> usize {
        999
    }

    /// Escape character declared after LIKE patterns, if the dialect needs
    /// an explicit `ESCAPE` clause.
    fn like_escape(&self) -> Option<char> {
        None
    }

    /// Renders the LIMIT/OFFSET tail, or an empty string.
    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(l), Some(o)) if o > 0 => format!("LIMIT {l} OFFSET {o}"),
            (Some(l), _) => format!("LIMIT {l}"),
            (None, Some(o)) if o > 0 => format!("OFFSET {o}"),
            _ => String::new(),
        }
    }

    /// Spellings of the non-portable column types.
    fn type_names(&self) -> TypeNames {
        TypeNames::ANSI
    }

    /// Maps a `DataType` to the dialect-specific SQL type.
    fn data_type_sql(&self, data_type: &DataType) -> String {
        data_type.render(&self.type_names())
    }

    /// Returns the auto-increment keyword, with a leading space.
    fn autoincrement_keyword(&self) -> &'static str {
        ""
    }

    /// Names of the GREATEST and LEAST functions.
    fn greatest_least(&self) -> (&'static str, &'static str) {
        ("GREATEST", "LEAST")
    }

    /// Generates an INSERT of a row made only of column defaults.
    fn insert_default_values(&self, table: &str) -> String {
        format!("INSERT INTO {table} DEFAULT VALUES")
    }

    /// Returns the upsert syntax family.
    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::Unsupported
    }

    /// Generates SQL for renaming a table.
    fn rename_table(&self, old: &str, new: &str) -> String {
        format!("ALTER TABLE {old} RENAME TO {new}")
    }

    /// Generates SQL for emptying a table.
    fn truncate_table(&self, table: &str) -> String {
        format!("TRUNCATE TABLE {table}")
    }

    /// Generates SQL for dropping an index.
    fn drop_index(&self, name: &str, _table: &str) -> String {
        format!("DROP INDEX {name}")
    }

    /// Returns whether constraints can be added with `ALTER TABLE ... ADD`.
    fn supports_alter_constraints(&self) -> bool {
        true
    }

    /// Generates SQL for dropping a named constraint.
    fn drop_constraint(&self, _kind: ConstraintKind, name: &str, table: &str) -> Result<String> {
        if !self.supports_alter_constraints() {
            return Err(self.not_supported("DROP CONSTRAINT"));
        }
        Ok(format!("ALTER TABLE {table} DROP CONSTRAINT {name}"))
    }

    /// Generates SQL for changing a column's type.
    fn alter_column(&self, table: &str, column: &str, type_sql: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {table} ALTER COLUMN {column} {type_sql}"
        ))
    }

    /// Generates SQL for a column comment. `comment` is already a literal.
    fn comment_on_column(&self, table: &str, column: &str, comment: &str) -> Result<String> {
        Ok(format!("COMMENT ON COLUMN {table}.{column} IS {comment}"))
    }

    /// Generates SQL for a table comment. `comment` is already a literal.
    fn comment_on_table(&self, table: &str, comment: &str) -> Result<String> {
        Ok(format!("COMMENT ON TABLE {table} IS {comment}"))
    }

    /// Builds a [`BuildError::NotSupported`] for this dialect.
    fn not_supported(&self, operation: &'static str) -> BuildError {
        BuildError::NotSupported {
            dialect: self.name(),
            operation,
        }
    }
}

fn shorthand_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\{\{(%?[\w\-\. ]+%?)\}\}|\[\[([\w\-\. ]+)\]\])")
            .unwrap_or_else(|e| unreachable!("invalid shorthand pattern: {e}"))
    })
}

/// Rewrites `{{table}}` and `[[column]]` markers into quoted identifiers.
///
/// A `%` inside a table marker is replaced by `table_prefix`, so
/// `{{%user}}` becomes the quoted `<prefix>user`. String literals are copied
/// as they are.
#[must_use]
pub fn quote_sql(dialect: &dyn Dialect, sql: &str, table_prefix: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    for span in string_literal_spans(sql, dialect.supports_dollar_quoting()) {
        out.push_str(&resolve_markers(dialect, &sql[last..span.start], table_prefix));
        out.push_str(&sql[span.start..span.end]);
        last = span.end;
    }
    out.push_str(&resolve_markers(dialect, &sql[last..], table_prefix));
    out
}

fn resolve_markers<'s>(dialect: &dyn Dialect, sql: &'s str, table_prefix: &str) -> Cow<'s, str> {
    shorthand_regex().replace_all(sql, |caps: &Captures<'_>| {
        if let Some(column) = caps.get(3) {
            dialect.quote_column_name(column.as_str())
        } else {
            let table = caps
                .get(2)
                .map_or("", |m| m.as_str())
                .replace('%', table_prefix);
            dialect.quote_table_name(&table)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_column_name() {
        let d = GenericDialect::new();
        assert_eq!(d.quote_column_name("name"), "\"name\"");
        assert_eq!(d.quote_column_name("t.name"), "\"t\".\"name\"");
        assert_eq!(d.quote_column_name("s.t.name"), "\"s\".\"t\".\"name\"");
        assert_eq!(d.quote_column_name("t.*"), "\"t\".*");
        assert_eq!(d.quote_column_name("*"), "*");
        assert_eq!(d.quote_column_name("COUNT(*)"), "COUNT(*)");
        assert_eq!(d.quote_column_name("\"already\""), "\"already\"");
    }

    #[test]
    fn test_quote_table_name() {
        let d = GenericDialect::new();
        assert_eq!(d.quote_table_name("public.user"), "\"public\".\"user\"");
        assert_eq!(d.quote_table_name("(SELECT 1)"), "(SELECT 1)");
    }

    #[test]
    fn test_embedded_quote_is_escaped() {
        let d = GenericDialect::new();
        assert_eq!(d.quote_simple_column_name("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_literals() {
        let d = GenericDialect::new();
        assert_eq!(d.literal(&SqlValue::Null).as_deref(), Some("NULL"));
        assert_eq!(d.literal(&SqlValue::Bool(false)).as_deref(), Some("FALSE"));
        assert_eq!(d.literal(&SqlValue::Int(-3)).as_deref(), Some("-3"));
        assert_eq!(
            d.literal(&SqlValue::Text("O'Brien".into())).as_deref(),
            Some("'O''Brien'")
        );
        assert_eq!(
            d.literal(&SqlValue::Blob(vec![0x48, 0x49])).as_deref(),
            Some("X'4849'")
        );
        let stream = crate::param::LobStream::new(std::io::Cursor::new(vec![1_u8]));
        assert_eq!(d.literal(&SqlValue::Stream(stream)), None);
    }

    #[test]
    fn test_sql_injection_prevention() {
        let d = GenericDialect::new();
        let escaped = d.quote_value("'; DROP TABLE users; --");
        assert_eq!(escaped, "'''; DROP TABLE users; --'");
    }

    #[test]
    fn test_quote_sql_shorthand() {
        let d = GenericDialect::new();
        assert_eq!(
            quote_sql(&d, "SELECT [[id]], [[t.name]] FROM {{%user}} t", "tbl_"),
            "SELECT \"id\", \"t\".\"name\" FROM \"tbl_user\" t"
        );
        assert_eq!(quote_sql(&d, "SELECT 1", "p_"), "SELECT 1");
    }

    #[test]
    fn test_quote_sql_leaves_literals_alone() {
        let d = GenericDialect::new();
        assert_eq!(
            quote_sql(&d, "SELECT [[a]] FROM {{t}} WHERE b = 'see [[id]] and {{orders}}'", ""),
            "SELECT \"a\" FROM \"t\" WHERE b = 'see [[id]] and {{orders}}'"
        );
        assert_eq!(
            quote_sql(&d, "SELECT 'it''s [[x]]', [[y]]", ""),
            "SELECT 'it''s [[x]]', \"y\""
        );
        let pg = PostgresDialect::new();
        assert_eq!(
            quote_sql(&pg, "SELECT $$ [[x]] $$, [[y]]", ""),
            "SELECT $$ [[x]] $$, \"y\""
        );
    }

    #[test]
    fn test_default_limit_offset() {
        let d = GenericDialect::new();
        assert_eq!(d.limit_offset(Some(10), Some(20)), "LIMIT 10 OFFSET 20");
        assert_eq!(d.limit_offset(Some(10), None), "LIMIT 10");
        assert_eq!(d.limit_offset(None, Some(5)), "OFFSET 5");
        assert_eq!(d.limit_offset(None, None), "");
    }
}
