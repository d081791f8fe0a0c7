//! CREATE / ALTER / DROP statements.
//!
//! Every statement here changes a table's shape, so each one is marked to
//! refresh that table's cached schema once it has run.

use super::{QueryBuilder, Statement};
use crate::column::{ColumnType, DefaultValue, ForeignKeyAction};
use crate::dialect::ConstraintKind;
use crate::error::{BuildError, Result};
use crate::param::{Params, SqlValue};
use crate::query::Query;
use crate::raw_sql::raw_sql;

/// A named foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    name: String,
    columns: Vec<String>,
    ref_table: String,
    ref_columns: Vec<String>,
    on_delete: Option<ForeignKeyAction>,
    on_update: Option<ForeignKeyAction>,
}

impl ForeignKey {
    /// Creates a foreign key from `columns` to `ref_table(ref_columns)`.
    pub fn new(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
        ref_table: impl Into<String>,
        ref_columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            ref_table: ref_table.into(),
            ref_columns: ref_columns.into_iter().map(Into::into).collect(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub const fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub const fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// Returns the constraint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The body of a view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewSource {
    /// A query; its parameters are inlined since views cannot bind.
    Query(Query),
    /// Raw SELECT text.
    Sql(String),
}

impl From<Query> for ViewSource {
    fn from(query: Query) -> Self {
        Self::Query(query)
    }
}

impl From<&str> for ViewSource {
    fn from(sql: &str) -> Self {
        Self::Sql(String::from(sql))
    }
}

impl From<String> for ViewSource {
    fn from(sql: String) -> Self {
        Self::Sql(sql)
    }
}

impl QueryBuilder {
    /// Renders a column type: raw text verbatim, or a definition through the
    /// dialect's type mapping followed by its constraints.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidArgument`] for a stream default.
    pub fn column_type_sql(&self, column: &ColumnType) -> Result<String> {
        let def = match column {
            ColumnType::Raw(sql) => return Ok(sql.clone()),
            ColumnType::Defined(def) => def,
        };
        let mut sql = self.dialect().data_type_sql(&def.data_type);
        if !def.nullable && !def.primary_key {
            sql.push_str(" NOT NULL");
        }
        if def.unique {
            sql.push_str(" UNIQUE");
        }
        if def.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if def.autoincrement {
            sql.push_str(self.dialect().autoincrement_keyword());
        }
        match &def.default {
            Some(DefaultValue::Value(value)) => {
                let literal = self
                    .dialect()
                    .literal(value)
                    .ok_or_else(|| BuildError::invalid("a stream cannot be a column default"))?;
                sql.push_str(" DEFAULT ");
                sql.push_str(&literal);
            }
            Some(DefaultValue::Expression(expr)) => {
                sql.push_str(" DEFAULT ");
                sql.push_str(expr);
            }
            None => {}
        }
        if let Some(check) = &def.check {
            sql.push_str(&format!(" CHECK ({check})"));
        }
        if let Some(append) = &def.append {
            sql.push(' ');
            sql.push_str(append);
        }
        Ok(sql)
    }

    /// The table name a schema cache knows: markers stripped, prefix applied.
    fn schema_name(&self, table: &str) -> String {
        let name = table
            .strip_prefix("{{")
            .and_then(|t| t.strip_suffix("}}"))
            .map_or_else(
                || String::from(table),
                |t| t.replace('%', self.table_prefix()),
            );
        name.replace(['"', '`'], "")
    }

    fn ddl(&self, sql: &str, table: &str) -> Statement {
        self.statement(sql, Params::new())
            .refreshing(self.schema_name(table))
    }

    fn ensure_alter_constraints(&self, operation: &'static str) -> Result<()> {
        if self.dialect().supports_alter_constraints() {
            Ok(())
        } else {
            Err(self.dialect().not_supported(operation))
        }
    }

    /// Builds `CREATE TABLE`. A column with an empty name is emitted as a
    /// raw table-level clause, e.g. a composite `PRIMARY KEY (a, b)`.
    /// `options` is appended after the closing parenthesis.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidArgument`] when no column is given.
    pub fn create_table<K, C>(
        &self,
        table: &str,
        columns: impl IntoIterator<Item = (K, C)>,
        options: Option<&str>,
    ) -> Result<Statement>
    where
        K: Into<String>,
        C: Into<ColumnType>,
    {
        let defs = columns
            .into_iter()
            .map(|(name, column)| {
                let name: String = name.into();
                let column: ColumnType = column.into();
                if name.is_empty() {
                    Ok(format!("    {}", self.column_type_sql(&column)?))
                } else {
                    Ok(format!(
                        "    {} {}",
                        self.quote_column(&name),
                        self.column_type_sql(&column)?
                    ))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        if defs.is_empty() {
            return Err(BuildError::invalid("CREATE TABLE needs at least one column"));
        }
        let mut sql = format!(
            "CREATE TABLE {} (\n{}\n)",
            self.quote_table(table),
            defs.join(",\n")
        );
        if let Some(options) = options {
            sql.push(' ');
            sql.push_str(options);
        }
        Ok(self.ddl(&sql, table))
    }

    /// Builds a table rename.
    #[must_use]
    pub fn rename_table(&self, table: &str, new_name: &str) -> Statement {
        let sql = self
            .dialect()
            .rename_table(&self.quote_table(table), &self.quote_table(new_name));
        self.ddl(&sql, table)
    }

    /// Builds `DROP TABLE`.
    #[must_use]
    pub fn drop_table(&self, table: &str) -> Statement {
        self.ddl(&format!("DROP TABLE {}", self.quote_table(table)), table)
    }

    /// Builds a statement removing every row of `table`.
    #[must_use]
    pub fn truncate_table(&self, table: &str) -> Statement {
        let sql = self.dialect().truncate_table(&self.quote_table(table));
        self.ddl(&sql, table)
    }

    /// Builds `ALTER TABLE ... ADD COLUMN`.
    ///
    /// # Errors
    ///
    /// Propagates column type errors.
    pub fn add_column(
        &self,
        table: &str,
        column: &str,
        column_type: impl Into<ColumnType>,
    ) -> Result<Statement> {
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            self.quote_table(table),
            self.quote_column(column),
            self.column_type_sql(&column_type.into())?
        );
        Ok(self.ddl(&sql, table))
    }

    /// Builds `ALTER TABLE ... DROP COLUMN`.
    #[must_use]
    pub fn drop_column(&self, table: &str, column: &str) -> Statement {
        let sql = format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_table(table),
            self.quote_column(column)
        );
        self.ddl(&sql, table)
    }

    /// Builds `ALTER TABLE ... RENAME COLUMN`.
    #[must_use]
    pub fn rename_column(&self, table: &str, old_name: &str, new_name: &str) -> Statement {
        let sql = format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.quote_table(table),
            self.quote_column(old_name),
            self.quote_column(new_name)
        );
        self.ddl(&sql, table)
    }

    /// Builds a column type change.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NotSupported`] where columns cannot be altered.
    pub fn alter_column(
        &self,
        table: &str,
        column: &str,
        column_type: impl Into<ColumnType>,
    ) -> Result<Statement> {
        let type_sql = self.column_type_sql(&column_type.into())?;
        let sql = self.dialect().alter_column(
            &self.quote_table(table),
            &self.quote_column(column),
            &type_sql,
        )?;
        Ok(self.ddl(&sql, table))
    }

    /// Builds `ALTER TABLE ... ADD CONSTRAINT name PRIMARY KEY (...)`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NotSupported`] where constraints cannot be
    /// added to an existing table.
    pub fn add_primary_key<S: AsRef<str>>(
        &self,
        name: &str,
        table: &str,
        columns: &[S],
    ) -> Result<Statement> {
        self.ensure_alter_constraints("ADD PRIMARY KEY")?;
        let sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
            self.quote_table(table),
            self.quote_column(name),
            self.quote_columns(columns)
        );
        Ok(self.ddl(&sql, table))
    }

    /// Builds a primary key removal.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NotSupported`] where constraints cannot be
    /// dropped.
    pub fn drop_primary_key(&self, name: &str, table: &str) -> Result<Statement> {
        self.drop_constraint(ConstraintKind::PrimaryKey, name, table)
    }

    /// Builds `ALTER TABLE ... ADD CONSTRAINT name FOREIGN KEY ...`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NotSupported`] where constraints cannot be
    /// added, and [`BuildError::InvalidArgument`] for an empty column list.
    pub fn add_foreign_key(&self, table: &str, foreign_key: &ForeignKey) -> Result<Statement> {
        self.ensure_alter_constraints("ADD FOREIGN KEY")?;
        if foreign_key.columns.is_empty() || foreign_key.ref_columns.is_empty() {
            return Err(BuildError::invalid("a foreign key needs columns on both sides"));
        }
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_table(table),
            self.quote_column(&foreign_key.name),
            self.quote_columns(&foreign_key.columns),
            self.quote_table(&foreign_key.ref_table),
            self.quote_columns(&foreign_key.ref_columns)
        );
        if let Some(action) = foreign_key.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = foreign_key.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        Ok(self.ddl(&sql, table))
    }

    /// Builds a foreign key removal.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NotSupported`] where constraints cannot be
    /// dropped.
    pub fn drop_foreign_key(&self, name: &str, table: &str) -> Result<Statement> {
        self.drop_constraint(ConstraintKind::ForeignKey, name, table)
    }

    /// Builds `CREATE [UNIQUE] INDEX name ON table (...)`. Entries containing
    /// parentheses are emitted as index expressions.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidArgument`] for an empty column list.
    pub fn create_index<S: AsRef<str>>(
        &self,
        name: &str,
        table: &str,
        columns: &[S],
        unique: bool,
    ) -> Result<Statement> {
        if columns.is_empty() {
            return Err(BuildError::invalid("an index needs at least one column"));
        }
        let sql = format!(
            "CREATE {}INDEX {} ON {} ({})",
            if unique { "UNIQUE " } else { "" },
            self.quote_table(name),
            self.quote_table(table),
            self.quote_columns(columns)
        );
        Ok(self.ddl(&sql, table))
    }

    /// Builds an index removal.
    #[must_use]
    pub fn drop_index(&self, name: &str, table: &str) -> Statement {
        let sql = self
            .dialect()
            .drop_index(&self.quote_table(name), &self.quote_table(table));
        self.ddl(&sql, table)
    }

    /// Builds `ALTER TABLE ... ADD CONSTRAINT name UNIQUE (...)`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NotSupported`] where constraints cannot be
    /// added to an existing table.
    pub fn add_unique<S: AsRef<str>>(
        &self,
        name: &str,
        table: &str,
        columns: &[S],
    ) -> Result<Statement> {
        self.ensure_alter_constraints("ADD UNIQUE")?;
        let sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
            self.quote_table(table),
            self.quote_column(name),
            self.quote_columns(columns)
        );
        Ok(self.ddl(&sql, table))
    }

    /// Builds a unique constraint removal.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NotSupported`] where constraints cannot be
    /// dropped.
    pub fn drop_unique(&self, name: &str, table: &str) -> Result<Statement> {
        self.drop_constraint(ConstraintKind::Unique, name, table)
    }

    /// Builds `ALTER TABLE ... ADD CONSTRAINT name CHECK (...)`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NotSupported`] where constraints cannot be
    /// added to an existing table.
    pub fn add_check(&self, name: &str, table: &str, expression: &str) -> Result<Statement> {
        self.ensure_alter_constraints("ADD CHECK")?;
        let sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} CHECK ({expression})",
            self.quote_table(table),
            self.quote_column(name)
        );
        Ok(self.ddl(&sql, table))
    }

    /// Builds a check constraint removal.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NotSupported`] where constraints cannot be
    /// dropped.
    pub fn drop_check(&self, name: &str, table: &str) -> Result<Statement> {
        self.drop_constraint(ConstraintKind::Check, name, table)
    }

    fn drop_constraint(&self, kind: ConstraintKind, name: &str, table: &str) -> Result<Statement> {
        let sql = self.dialect().drop_constraint(
            kind,
            &self.quote_column(name),
            &self.quote_table(table),
        )?;
        Ok(self.ddl(&sql, table))
    }

    /// Builds a column comment.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NotSupported`] where comments are unavailable.
    pub fn add_comment_on_column(
        &self,
        table: &str,
        column: &str,
        comment: &str,
    ) -> Result<Statement> {
        let sql = self.dialect().comment_on_column(
            &self.quote_table(table),
            &self.quote_column(column),
            &self.quote_value(comment),
        )?;
        Ok(self.ddl(&sql, table))
    }

    /// Builds a table comment.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NotSupported`] where comments are unavailable.
    pub fn add_comment_on_table(&self, table: &str, comment: &str) -> Result<Statement> {
        let sql = self
            .dialect()
            .comment_on_table(&self.quote_table(table), &self.quote_value(comment))?;
        Ok(self.ddl(&sql, table))
    }

    /// Builds `CREATE VIEW name AS ...`.
    ///
    /// A query body is built and its parameters are inlined as literals.
    ///
    /// # Errors
    ///
    /// Propagates query errors, and returns [`BuildError::InvalidArgument`]
    /// when a query parameter is a stream.
    pub fn create_view(&self, name: &str, source: &ViewSource) -> Result<Statement> {
        let body = match source {
            ViewSource::Sql(sql) => sql.clone(),
            ViewSource::Query(query) => {
                let mut params = Params::new();
                let sql = self.build(query, &mut params)?;
                if params
                    .iter()
                    .any(|(_, p)| matches!(p.value(), SqlValue::Stream(_)))
                {
                    return Err(BuildError::invalid("a view cannot inline a stream parameter"));
                }
                raw_sql(self.dialect(), &sql, &params)
            }
        };
        let sql = format!("CREATE VIEW {} AS {body}", self.quote_table(name));
        Ok(self.ddl(&sql, name))
    }

    /// Builds `DROP VIEW`.
    #[must_use]
    pub fn drop_view(&self, name: &str) -> Statement {
        self.ddl(&format!("DROP VIEW {}", self.quote_table(name)), name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::column::{self, DataType};
    use crate::condition::Condition;
    use crate::dialect::{GenericDialect, MysqlDialect, PostgresDialect, SqliteDialect};
    use crate::param::LobStream;

    fn generic() -> QueryBuilder {
        QueryBuilder::new(Arc::new(GenericDialect::new()))
    }

    fn sqlite() -> QueryBuilder {
        QueryBuilder::new(Arc::new(SqliteDialect::new()))
    }

    fn mysql() -> QueryBuilder {
        QueryBuilder::new(Arc::new(MysqlDialect::new()))
    }

    #[test]
    fn test_create_table_sqlite() {
        let stmt = sqlite()
            .create_table(
                "user",
                [
                    ("id", ColumnType::from(column::primary_key())),
                    ("email", column::varchar(255).not_null().unique().into()),
                    ("active", column::boolean().not_null().default_value(true).into()),
                    ("created_at", column::timestamp().default_expr("CURRENT_TIMESTAMP").into()),
                    ("age", column::integer().check("age >= 0").into()),
                    ("note", ColumnType::from("TEXT COLLATE NOCASE")),
                ],
                None,
            )
            .unwrap();
        assert_eq!(
            stmt.sql,
            "CREATE TABLE \"user\" (\n    \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
             \"email\" TEXT NOT NULL UNIQUE,\n    \"active\" INTEGER NOT NULL DEFAULT TRUE,\n    \
             \"created_at\" TEXT DEFAULT CURRENT_TIMESTAMP,\n    \"age\" INTEGER CHECK (age >= 0),\n    \
             \"note\" TEXT COLLATE NOCASE\n)"
        );
        assert_eq!(stmt.refresh_table.as_deref(), Some("user"));
    }

    #[test]
    fn test_create_table_raw_clause_and_options() {
        let stmt = mysql()
            .create_table(
                "{{%tag}}",
                [
                    ("post_id", ColumnType::from("INT NOT NULL")),
                    ("name", ColumnType::from("VARCHAR(32) NOT NULL")),
                    ("", ColumnType::from("PRIMARY KEY (post_id, name)")),
                ],
                Some("ENGINE=InnoDB"),
            )
            .unwrap();
        assert_eq!(
            stmt.sql,
            "CREATE TABLE `tag` (\n    `post_id` INT NOT NULL,\n    `name` VARCHAR(32) NOT NULL,\n    \
             PRIMARY KEY (post_id, name)\n) ENGINE=InnoDB"
        );
        assert_eq!(stmt.refresh_table.as_deref(), Some("tag"));
    }

    #[test]
    fn test_create_table_errors() {
        assert!(generic()
            .create_table("t", Vec::<(&str, ColumnType)>::new(), None)
            .is_err());
        let stream = column::blob().default_value(LobStream::new(std::io::empty()));
        assert!(generic().create_table("t", [("b", stream)], None).is_err());
    }

    #[test]
    fn test_schema_name_uses_prefix() {
        let qb = generic().with_table_prefix("app_");
        let stmt = qb.drop_table("{{%user}}");
        assert_eq!(stmt.sql, "DROP TABLE \"app_user\"");
        assert_eq!(stmt.refresh_table.as_deref(), Some("app_user"));
    }

    #[test]
    fn test_table_statements() {
        assert_eq!(
            generic().rename_table("a", "b").sql,
            "ALTER TABLE \"a\" RENAME TO \"b\""
        );
        assert_eq!(mysql().rename_table("a", "b").sql, "RENAME TABLE `a` TO `b`");
        assert_eq!(generic().truncate_table("t").sql, "TRUNCATE TABLE \"t\"");
        assert_eq!(sqlite().truncate_table("t").sql, "DELETE FROM \"t\"");
        assert_eq!(generic().rename_table("a", "b").refresh_table.as_deref(), Some("a"));
    }

    #[test]
    fn test_column_statements() {
        let qb = generic();
        assert_eq!(
            qb.add_column("t", "c", column::varchar(10).not_null()).unwrap().sql,
            "ALTER TABLE \"t\" ADD COLUMN \"c\" VARCHAR(10) NOT NULL"
        );
        assert_eq!(
            qb.drop_column("t", "c").sql,
            "ALTER TABLE \"t\" DROP COLUMN \"c\""
        );
        assert_eq!(
            qb.rename_column("t", "a", "b").sql,
            "ALTER TABLE \"t\" RENAME COLUMN \"a\" TO \"b\""
        );
        assert_eq!(qb.drop_column("t", "c").refresh_table.as_deref(), Some("t"));
    }

    #[test]
    fn test_alter_column_per_dialect() {
        let pg = QueryBuilder::new(Arc::new(PostgresDialect::new()));
        assert_eq!(
            pg.alter_column("t", "c", column::ColumnBuilder::new(DataType::Bigint))
                .unwrap()
                .sql,
            "ALTER TABLE \"t\" ALTER COLUMN \"c\" TYPE BIGINT"
        );
        assert_eq!(
            mysql().alter_column("t", "c", "VARCHAR(20)").unwrap().sql,
            "ALTER TABLE `t` CHANGE `c` `c` VARCHAR(20)"
        );
        assert!(matches!(
            sqlite().alter_column("t", "c", "TEXT"),
            Err(BuildError::NotSupported { .. })
        ));
    }

    #[test]
    fn test_constraints() {
        let qb = generic();
        assert_eq!(
            qb.add_primary_key("pk_t", "t", &["a", "b"]).unwrap().sql,
            "ALTER TABLE \"t\" ADD CONSTRAINT \"pk_t\" PRIMARY KEY (\"a\", \"b\")"
        );
        assert_eq!(
            qb.add_unique("uq_t", "t", &["a"]).unwrap().sql,
            "ALTER TABLE \"t\" ADD CONSTRAINT \"uq_t\" UNIQUE (\"a\")"
        );
        assert_eq!(
            qb.add_check("ck_t", "t", "a > 0").unwrap().sql,
            "ALTER TABLE \"t\" ADD CONSTRAINT \"ck_t\" CHECK (a > 0)"
        );
        assert_eq!(
            qb.drop_unique("uq_t", "t").unwrap().sql,
            "ALTER TABLE \"t\" DROP CONSTRAINT \"uq_t\""
        );
        assert_eq!(
            mysql().drop_primary_key("pk_t", "t").unwrap().sql,
            "ALTER TABLE `t` DROP PRIMARY KEY"
        );
        assert_eq!(
            mysql().drop_check("ck_t", "t").unwrap().sql,
            "ALTER TABLE `t` DROP CHECK `ck_t`"
        );
    }

    #[test]
    fn test_constraints_not_supported_on_sqlite() {
        let qb = sqlite();
        assert_eq!(
            qb.add_primary_key("pk", "t", &["a"]),
            Err(BuildError::NotSupported {
                dialect: "sqlite",
                operation: "ADD PRIMARY KEY"
            })
        );
        assert!(qb.add_check("ck", "t", "a > 0").is_err());
        assert!(qb.drop_foreign_key("fk", "t").is_err());
    }

    #[test]
    fn test_foreign_keys() {
        let fk = ForeignKey::new("fk_post_user", ["user_id"], "user", ["id"])
            .on_delete(ForeignKeyAction::Cascade)
            .on_update(ForeignKeyAction::NoAction);
        assert_eq!(
            generic().add_foreign_key("post", &fk).unwrap().sql,
            "ALTER TABLE \"post\" ADD CONSTRAINT \"fk_post_user\" FOREIGN KEY (\"user_id\") \
             REFERENCES \"user\" (\"id\") ON DELETE CASCADE ON UPDATE NO ACTION"
        );
        assert_eq!(
            mysql().drop_foreign_key(fk.name(), "post").unwrap().sql,
            "ALTER TABLE `post` DROP FOREIGN KEY `fk_post_user`"
        );
        let empty = ForeignKey::new("fk", Vec::<String>::new(), "user", ["id"]);
        assert!(generic().add_foreign_key("post", &empty).is_err());
    }

    #[test]
    fn test_indexes() {
        assert_eq!(
            generic()
                .create_index("idx_name", "user", &["last_name", "LOWER(first_name)"], false)
                .unwrap()
                .sql,
            "CREATE INDEX \"idx_name\" ON \"user\" (\"last_name\", LOWER(first_name))"
        );
        assert_eq!(
            generic().create_index("uq", "user", &["email"], true).unwrap().sql,
            "CREATE UNIQUE INDEX \"uq\" ON \"user\" (\"email\")"
        );
        assert!(generic().create_index::<&str>("i", "t", &[], false).is_err());
        assert_eq!(generic().drop_index("uq", "user").sql, "DROP INDEX \"uq\"");
        assert_eq!(mysql().drop_index("uq", "user").sql, "DROP INDEX `uq` ON `user`");
    }

    #[test]
    fn test_comments() {
        let pg = QueryBuilder::new(Arc::new(PostgresDialect::new()));
        assert_eq!(
            pg.add_comment_on_column("t", "c", "the c's").unwrap().sql,
            "COMMENT ON COLUMN \"t\".\"c\" IS 'the c''s'"
        );
        assert_eq!(
            pg.add_comment_on_table("t", "all t").unwrap().sql,
            "COMMENT ON TABLE \"t\" IS 'all t'"
        );
        assert_eq!(
            mysql().add_comment_on_table("t", "all t").unwrap().sql,
            "ALTER TABLE `t` COMMENT 'all t'"
        );
        assert!(mysql().add_comment_on_column("t", "c", "x").is_err());
        assert!(sqlite().add_comment_on_table("t", "x").is_err());
    }

    #[test]
    fn test_views() {
        let query = Query::new()
            .select(["id", "name"])
            .from("user")
            .where_clause(Condition::eq("status", "active"));
        let stmt = generic().create_view("active_user", &query.into()).unwrap();
        assert_eq!(
            stmt.sql,
            "CREATE VIEW \"active_user\" AS SELECT \"id\", \"name\" FROM \"user\" WHERE \"status\" = 'active'"
        );
        assert!(stmt.params.is_empty());
        assert_eq!(stmt.refresh_table.as_deref(), Some("active_user"));

        let stmt = generic()
            .create_view("v", &"SELECT 1".into())
            .unwrap();
        assert_eq!(stmt.sql, "CREATE VIEW \"v\" AS SELECT 1");
        assert_eq!(generic().drop_view("v").sql, "DROP VIEW \"v\"");
    }

    #[test]
    fn test_markers_inside_literals_are_kept() {
        let pg = QueryBuilder::new(Arc::new(PostgresDialect::new()));
        assert_eq!(
            pg.add_comment_on_table("user", "see [[id]] and {{orders}}")
                .unwrap()
                .sql,
            "COMMENT ON TABLE \"user\" IS 'see [[id]] and {{orders}}'"
        );
        let query = Query::new()
            .select(["id"])
            .from("post")
            .where_clause(Condition::eq("tag", "[[x]]"));
        assert_eq!(
            generic().create_view("tagged", &query.into()).unwrap().sql,
            "CREATE VIEW \"tagged\" AS SELECT \"id\" FROM \"post\" WHERE \"tag\" = '[[x]]'"
        );
    }
}
