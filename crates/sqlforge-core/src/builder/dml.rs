//! INSERT, UPDATE, DELETE and UPSERT rendering.

use indexmap::IndexMap;

use super::{QueryBuilder, Statement};
use crate::condition::Condition;
use crate::dialect::UpsertStyle;
use crate::error::{BuildError, Result};
use crate::expression::Value;
use crate::param::Params;
use crate::query::Query;

/// What an INSERT inserts.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// One row of `column → value`. An empty map inserts column defaults.
    Values(IndexMap<String, Value>),
    /// The rows of a sub-query. Its select list names the target columns.
    Query(Query),
}

impl InsertSource {
    /// Builds a row from `(column, value)` pairs.
    pub fn values<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Values(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Target column names.
    fn column_names(&self) -> Result<Vec<String>> {
        match self {
            Self::Values(values) => Ok(values.keys().cloned().collect()),
            Self::Query(query) => query.column_names(),
        }
    }
}

impl From<Query> for InsertSource {
    fn from(query: Query) -> Self {
        Self::Query(query)
    }
}

/// What an UPSERT does when the row already exists.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertUpdate {
    /// Update every inserted column that is not part of the conflict target.
    All,
    /// Keep the existing row.
    None,
    /// Update only these columns with these values.
    Columns(IndexMap<String, Value>),
}

impl From<bool> for UpsertUpdate {
    fn from(update: bool) -> Self {
        if update {
            Self::All
        } else {
            Self::None
        }
    }
}

impl QueryBuilder {
    /// Builds `INSERT INTO table (...) VALUES (...)` or
    /// `INSERT INTO table (...) SELECT ...`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidArgument`] when a sub-query source
    /// selects `*`, nothing, or an unaliased expression.
    pub fn insert(&self, table: &str, source: &InsertSource) -> Result<Statement> {
        let mut params = Params::new();
        let sql = self.insert_sql(table, source, &mut params)?;
        Ok(self.statement(&sql, params))
    }

    fn insert_sql(&self, table: &str, source: &InsertSource, params: &mut Params) -> Result<String> {
        let table = self.quote_table(table);
        match source {
            InsertSource::Values(values) if values.is_empty() => {
                Ok(self.dialect().insert_default_values(&table))
            }
            InsertSource::Values(values) => {
                let columns: Vec<&String> = values.keys().collect();
                let placeholders = values
                    .values()
                    .map(|v| self.build_value(v, params))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!(
                    "INSERT INTO {table} ({}) VALUES ({})",
                    self.quote_columns(&columns),
                    placeholders.join(", ")
                ))
            }
            InsertSource::Query(query) => {
                let columns = query.column_names()?;
                let select = self.build(query, params)?;
                Ok(format!(
                    "INSERT INTO {table} ({}) {select}",
                    self.quote_columns(&columns)
                ))
            }
        }
    }

    /// Builds one multi-row INSERT.
    ///
    /// Scalar cells are inlined as escaped literals instead of being bound,
    /// which keeps large loads under the bound-parameter limit. Expression
    /// cells are built normally. No rows yields an empty statement.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidArgument`] for a row whose width differs
    /// from `columns`, or for a stream cell, which has no literal form.
    pub fn batch_insert<S: AsRef<str>>(
        &self,
        table: &str,
        columns: &[S],
        rows: &[Vec<Value>],
    ) -> Result<Statement> {
        if rows.is_empty() {
            return Ok(Statement::default());
        }
        let mut params = Params::new();
        let mut tuples = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            if !columns.is_empty() && row.len() != columns.len() {
                return Err(BuildError::invalid(format!(
                    "row {index} has {} values but {} columns were given",
                    row.len(),
                    columns.len()
                )));
            }
            let cells = row
                .iter()
                .map(|cell| match cell {
                    Value::Scalar(v) => self.dialect().literal(v).ok_or_else(|| {
                        BuildError::invalid("a stream cannot be inlined in a batch insert")
                    }),
                    Value::Expr(expr) => self.build_expression(expr, &mut params),
                })
                .collect::<Result<Vec<_>>>()?;
            tuples.push(format!("({})", cells.join(", ")));
        }

        // literals may contain marker-like text, so only the table is resolved
        let table = self.quote_table(&self.quote_sql(table));
        let sql = if columns.is_empty() {
            format!("INSERT INTO {table} VALUES {}", tuples.join(", "))
        } else {
            format!(
                "INSERT INTO {table} ({}) VALUES {}",
                self.quote_columns(columns),
                tuples.join(", ")
            )
        };
        Ok(Statement::new(sql, params))
    }

    /// Builds `UPDATE table SET ... [WHERE ...]`. Values are always bound.
    ///
    /// `params` carries values referenced by raw fragments of the condition.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidArgument`] when no column is given, and
    /// propagates condition errors.
    pub fn update<K, V>(
        &self,
        table: &str,
        columns: impl IntoIterator<Item = (K, V)>,
        condition: Option<&Condition>,
        params: Params,
    ) -> Result<Statement>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut params = params;
        let sets = columns
            .into_iter()
            .map(|(column, value)| {
                let column: String = column.into();
                let value: Value = value.into();
                let value = self.build_value(&value, &mut params)?;
                Ok(format!("{} = {value}", self.quote_column(&column)))
            })
            .collect::<Result<Vec<_>>>()?;
        if sets.is_empty() {
            return Err(BuildError::invalid("UPDATE needs at least one column"));
        }
        let mut sql = format!("UPDATE {} SET {}", self.quote_table(table), sets.join(", "));
        self.push_where(&mut sql, condition, &mut params)?;
        Ok(self.statement(&sql, params))
    }

    /// Builds `DELETE FROM table [WHERE ...]`.
    ///
    /// # Errors
    ///
    /// Propagates condition errors.
    pub fn delete(
        &self,
        table: &str,
        condition: Option<&Condition>,
        params: Params,
    ) -> Result<Statement> {
        let mut params = params;
        let mut sql = format!("DELETE FROM {}", self.quote_table(table));
        self.push_where(&mut sql, condition, &mut params)?;
        Ok(self.statement(&sql, params))
    }

    fn push_where(
        &self,
        sql: &mut String,
        condition: Option<&Condition>,
        params: &mut Params,
    ) -> Result<()> {
        if let Some(condition) = condition {
            let where_sql = self.build_condition(condition, params)?;
            if !where_sql.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&where_sql);
            }
        }
        Ok(())
    }

    /// Builds an insert-or-update statement.
    ///
    /// `conflict_target` names the unique columns a conflict is detected on.
    /// With `ON CONFLICT` syntax an update needs a target.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NotSupported`] for dialects without upsert
    /// syntax, and [`BuildError::InvalidArgument`] for an insert without
    /// columns or an `ON CONFLICT` update without a conflict target.
    pub fn upsert(
        &self,
        table: &str,
        insert: &InsertSource,
        update: &UpsertUpdate,
        conflict_target: &[&str],
    ) -> Result<Statement> {
        let style = self.dialect().upsert_style();
        if style == UpsertStyle::Unsupported {
            return Err(self.dialect().not_supported("UPSERT"));
        }
        let insert_columns = insert.column_names()?;
        if insert_columns.is_empty() {
            return Err(BuildError::invalid("UPSERT needs at least one insert column"));
        }

        let mut params = Params::new();
        let insert_sql = self.insert_sql(table, insert, &mut params)?;
        let excluded = |column: &str| {
            let column = self.quote_column(column);
            match style {
                UpsertStyle::OnDuplicateKey => format!("{column} = VALUES({column})"),
                _ => format!("{column} = EXCLUDED.{column}"),
            }
        };
        let sets: Vec<String> = match update {
            UpsertUpdate::All => insert_columns
                .iter()
                .filter(|c| !conflict_target.contains(&c.as_str()))
                .map(|c| excluded(c.as_str()))
                .collect(),
            UpsertUpdate::None => Vec::new(),
            UpsertUpdate::Columns(columns) => columns
                .iter()
                .map(|(column, value)| {
                    let value = self.build_value(value, &mut params)?;
                    Ok(format!("{} = {value}", self.quote_column(column)))
                })
                .collect::<Result<Vec<_>>>()?,
        };

        let sql = match style {
            UpsertStyle::OnConflict => {
                let target = if conflict_target.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", self.quote_columns(conflict_target))
                };
                if conflict_target.is_empty() && !matches!(update, UpsertUpdate::None) {
                    return Err(BuildError::invalid(
                        "ON CONFLICT DO UPDATE needs a conflict target",
                    ));
                }
                if sets.is_empty() {
                    format!("{insert_sql} ON CONFLICT{target} DO NOTHING")
                } else {
                    format!("{insert_sql} ON CONFLICT{target} DO UPDATE SET {}", sets.join(", "))
                }
            }
            UpsertStyle::OnDuplicateKey => {
                let sets = if sets.is_empty() {
                    // a no-op assignment turns the duplicate into an ignore
                    let key = conflict_target
                        .first()
                        .map(|c| String::from(*c))
                        .or_else(|| insert_columns.first().cloned())
                        .unwrap_or_default();
                    let key = self.quote_column(&key);
                    vec![format!("{key} = {key}")]
                } else {
                    sets
                };
                format!("{insert_sql} ON DUPLICATE KEY UPDATE {}", sets.join(", "))
            }
            UpsertStyle::Unsupported => return Err(self.dialect().not_supported("UPSERT")),
        };
        Ok(self.statement(&sql, params))
    }
}
