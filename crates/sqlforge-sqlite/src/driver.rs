//! [`Driver`] implementation over a single sqlx SQLite connection.

use sqlforge_command::{
    Connection, ConnectionConfig, Driver, DriverError, IsolationLevel, Row,
    TransactionBoundary,
};
use sqlforge_core::{Param, ParamKey, SqlValue};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{Column, Connection as _, Executor, Sqlite, TypeInfo, ValueRef};
use tracing::debug;

use crate::error::Result;
use crate::statement::SqliteStatement;

/// Runs commands on one SQLite connection.
#[derive(Debug)]
pub struct SqliteDriver {
    conn: SqliteConnection,
    in_transaction: bool,
}

impl SqliteDriver {
    /// Opens a connection, e.g. `sqlite::memory:` or `sqlite://app.db`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub async fn connect(url: &str) -> std::result::Result<Self, DriverError> {
        let conn = SqliteConnection::connect(url)
            .await
            .map_err(crate::SqliteError::from)?;
        Ok(Self::from_connection(conn))
    }

    /// Wraps an open sqlx connection.
    #[must_use]
    pub const fn from_connection(conn: SqliteConnection) -> Self {
        Self {
            conn,
            in_transaction: false,
        }
    }

    /// Opens the database named by `config.dsn` and wraps it in a
    /// [`Connection`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub async fn open(config: ConnectionConfig) -> sqlforge_command::Result<Connection<Self>> {
        let driver = Self::connect(&config.dsn).await?;
        Ok(Connection::new(driver, config))
    }

    async fn run(&mut self, sql: &str) -> Result<()> {
        debug!(sql = %sql, "Executing transaction statement");
        sqlx::query(sql).execute(&mut self.conn).await?;
        Ok(())
    }
}

/// Builds an sqlx query with the statement's values in marker order.
fn bound_query(statement: &SqliteStatement) -> Result<Query<'_, Sqlite, SqliteArguments<'_>>> {
    let mut query = sqlx::query(statement.sql());
    for value in statement.ordered_values()? {
        query = match value.clone() {
            SqlValue::Null => query.bind(Option::<i64>::None),
            SqlValue::Bool(b) => query.bind(b),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::Float(f) => query.bind(f),
            SqlValue::Text(s) => query.bind(s),
            SqlValue::Blob(b) => query.bind(b),
            // streams are read when bound
            SqlValue::Stream(stream) => query.bind(stream.drain()?),
        };
    }
    Ok(query)
}

/// Converts a row using each value's storage class.
fn convert_row(row: &SqliteRow) -> Result<Row> {
    use sqlx::Row as _;

    let mut converted = Row::with_capacity(row.columns().len());
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            let class = raw.type_info().name().to_ascii_uppercase();
            match class.as_str() {
                "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get_unchecked(index)?),
                "REAL" | "NUMERIC" => SqlValue::Float(row.try_get_unchecked(index)?),
                "BLOB" => SqlValue::Blob(row.try_get_unchecked(index)?),
                _ => SqlValue::Text(row.try_get_unchecked(index)?),
            }
        };
        converted.insert(String::from(column.name()), value);
    }
    Ok(converted)
}

impl TransactionBoundary for SqliteDriver {
    /// SQLite transactions are always serializable. Asking for an isolation
    /// level takes the write lock up front with `BEGIN IMMEDIATE`.
    async fn begin(
        &mut self,
        isolation: Option<IsolationLevel>,
    ) -> std::result::Result<(), DriverError> {
        let sql = if isolation.is_some() {
            "BEGIN IMMEDIATE"
        } else {
            "BEGIN"
        };
        self.run(sql).await?;
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> std::result::Result<(), DriverError> {
        self.run("COMMIT").await?;
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback(&mut self) -> std::result::Result<(), DriverError> {
        self.in_transaction = false;
        self.run("ROLLBACK").await?;
        Ok(())
    }

    fn is_in_transaction(&self) -> bool {
        self.in_transaction
    }
}

impl Driver for SqliteDriver {
    type Statement = SqliteStatement;

    async fn prepare(&mut self, sql: &str) -> std::result::Result<SqliteStatement, DriverError> {
        let statement = SqliteStatement::new(sql);
        // validates the SQL; sqlx keeps the handle in its statement cache
        Executor::prepare(&mut self.conn, statement.sql())
            .await
            .map_err(crate::SqliteError::from)?;
        Ok(statement)
    }

    fn bind_param(
        &mut self,
        statement: &mut SqliteStatement,
        key: &ParamKey,
        param: &Param,
    ) -> std::result::Result<(), DriverError> {
        Ok(statement.bind(key, param)?)
    }

    async fn execute(
        &mut self,
        statement: &mut SqliteStatement,
    ) -> std::result::Result<u64, DriverError> {
        let result = bound_query(statement)?
            .execute(&mut self.conn)
            .await
            .map_err(crate::SqliteError::from)?;
        Ok(result.rows_affected())
    }

    async fn fetch_all(
        &mut self,
        statement: &mut SqliteStatement,
    ) -> std::result::Result<Vec<Row>, DriverError> {
        let rows = bound_query(statement)?
            .fetch_all(&mut self.conn)
            .await
            .map_err(crate::SqliteError::from)?;
        Ok(rows.iter().map(convert_row).collect::<Result<Vec<_>>>()?)
    }

    async fn fetch_row(
        &mut self,
        statement: &mut SqliteStatement,
    ) -> std::result::Result<Option<Row>, DriverError> {
        let row = bound_query(statement)?
            .fetch_optional(&mut self.conn)
            .await
            .map_err(crate::SqliteError::from)?;
        Ok(row.as_ref().map(convert_row).transpose()?)
    }
}
