//! PostgreSQL dialect.

use super::{Dialect, UpsertStyle};
use crate::column::TypeNames;
use crate::error::Result;

/// PostgreSQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn blob_literal(&self, bytes: &[u8]) -> String {
        let hex: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
        format!("'\\x{hex}'::bytea")
    }

    fn supports_dollar_quoting(&self) -> bool {
        true
    }

    fn max_bound_params(&self) -> usize {
        65535
    }

    fn type_names(&self) -> TypeNames {
        TypeNames {
            double: "DOUBLE PRECISION",
            blob: "BYTEA",
            ..TypeNames::ANSI
        }
    }

    fn autoincrement_keyword(&self) -> &'static str {
        " GENERATED BY DEFAULT AS IDENTITY"
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::OnConflict
    }

    fn alter_column(&self, table: &str, column: &str, type_sql: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {table} ALTER COLUMN {column} TYPE {type_sql}"
        ))
    }
}
