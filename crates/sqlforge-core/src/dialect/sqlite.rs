//! SQLite dialect.

use super::{Dialect, UpsertStyle};
use crate::column::TypeNames;
use crate::error::Result;

/// SQLite dialect.
///
/// SQLite cannot add or drop constraints on an existing table, nor change
/// a column's type, so those DDL hooks report `NotSupported`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn like_escape(&self) -> Option<char> {
        // SQLite has no default LIKE escape character
        Some('\\')
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (None, Some(o)) if o > 0 => format!("LIMIT -1 OFFSET {o}"),
            (Some(l), Some(o)) if o > 0 => format!("LIMIT {l} OFFSET {o}"),
            (Some(l), _) => format!("LIMIT {l}"),
            _ => String::new(),
        }
    }

    fn type_names(&self) -> TypeNames {
        // dynamic typing: only the storage class matters, booleans are 0/1
        TypeNames {
            storage_classes: true,
            ..TypeNames::ANSI
        }
    }

    fn autoincrement_keyword(&self) -> &'static str {
        " AUTOINCREMENT"
    }

    fn greatest_least(&self) -> (&'static str, &'static str) {
        // multi-argument MAX/MIN are scalar functions in SQLite
        ("MAX", "MIN")
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::OnConflict
    }

    fn truncate_table(&self, table: &str) -> String {
        format!("DELETE FROM {table}")
    }

    fn supports_alter_constraints(&self) -> bool {
        false
    }

    fn alter_column(&self, _table: &str, _column: &str, _type_sql: &str) -> Result<String> {
        Err(self.not_supported("ALTER COLUMN"))
    }

    fn comment_on_column(&self, _table: &str, _column: &str, _comment: &str) -> Result<String> {
        Err(self.not_supported("COMMENT ON COLUMN"))
    }

    fn comment_on_table(&self, _table: &str, _comment: &str) -> Result<String> {
        Err(self.not_supported("COMMENT ON TABLE"))
    }
}
