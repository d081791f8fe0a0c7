//! MySQL dialect.

use super::{ConstraintKind, Dialect, UpsertStyle};
use crate::column::TypeNames;
use crate::error::Result;

/// MySQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('`', '`')
    }

    fn quote_value(&self, value: &str) -> String {
        // backslash is an escape character in MySQL string literals
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn max_bound_params(&self) -> usize {
        65535
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (None, Some(o)) if o > 0 => format!("LIMIT 18446744073709551615 OFFSET {o}"),
            (Some(l), Some(o)) if o > 0 => format!("LIMIT {l} OFFSET {o}"),
            (Some(l), _) => format!("LIMIT {l}"),
            _ => String::new(),
        }
    }

    fn type_names(&self) -> TypeNames {
        TypeNames {
            blob: "LONGBLOB",
            timestamp: "DATETIME",
            boolean: "TINYINT(1)",
            ..TypeNames::ANSI
        }
    }

    fn autoincrement_keyword(&self) -> &'static str {
        " AUTO_INCREMENT"
    }

    fn insert_default_values(&self, table: &str) -> String {
        format!("INSERT INTO {table} () VALUES ()")
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::OnDuplicateKey
    }

    fn rename_table(&self, old: &str, new: &str) -> String {
        format!("RENAME TABLE {old} TO {new}")
    }

    fn drop_index(&self, name: &str, table: &str) -> String {
        format!("DROP INDEX {name} ON {table}")
    }

    fn drop_constraint(&self, kind: ConstraintKind, name: &str, table: &str) -> Result<String> {
        Ok(match kind {
            ConstraintKind::PrimaryKey => format!("ALTER TABLE {table} DROP PRIMARY KEY"),
            ConstraintKind::ForeignKey => format!("ALTER TABLE {table} DROP FOREIGN KEY {name}"),
            ConstraintKind::Unique => format!("ALTER TABLE {table} DROP INDEX {name}"),
            ConstraintKind::Check => format!("ALTER TABLE {table} DROP CHECK {name}"),
        })
    }

    fn alter_column(&self, table: &str, column: &str, type_sql: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {table} CHANGE {column} {column} {type_sql}"
        ))
    }

    fn comment_on_column(&self, _table: &str, _column: &str, _comment: &str) -> Result<String> {
        // MySQL only accepts column comments inside a full column definition
        Err(self.not_supported("COMMENT ON COLUMN"))
    }

    fn comment_on_table(&self, table: &str, comment: &str) -> Result<String> {
        Ok(format!("ALTER TABLE {table} COMMENT {comment}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::DataType;

    #[test]
    fn test_mysql_type_names() {
        let d = MysqlDialect::new();
        assert_eq!(d.data_type_sql(&DataType::Boolean), "TINYINT(1)");
        assert_eq!(d.data_type_sql(&DataType::Timestamp), "DATETIME");
        assert_eq!(d.data_type_sql(&DataType::Varchar(Some(32))), "VARCHAR(32)");
    }

    #[test]
    fn test_mysql_quoting() {
        let d = MysqlDialect::new();
        assert_eq!(d.quote_column_name("u.name"), "`u`.`name`");
        assert_eq!(d.quote_value("a\\'b"), "'a\\\\''b'");
    }

    #[test]
    fn test_mysql_ddl_variants() {
        let d = MysqlDialect::new();
        assert_eq!(d.rename_table("`a`", "`b`"), "RENAME TABLE `a` TO `b`");
        assert_eq!(d.drop_index("`idx`", "`t`"), "DROP INDEX `idx` ON `t`");
        assert_eq!(
            d.drop_constraint(ConstraintKind::PrimaryKey, "`pk`", "`t`")
                .unwrap(),
            "ALTER TABLE `t` DROP PRIMARY KEY"
        );
        assert_eq!(
            d.limit_offset(None, Some(5)),
            "LIMIT 18446744073709551615 OFFSET 5"
        );
    }
}
