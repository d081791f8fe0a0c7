//! Contracts a database driver fulfils for the command layer.
//!
//! The command layer never talks to a database directly. It prepares a
//! statement, binds parameters one by one, then either executes it for an
//! affected-row count or fetches its rows. Transactions go through
//! [`TransactionBoundary`].

use indexmap::IndexMap;
use serde::Deserialize;
use sqlforge_core::{Param, ParamKey, SqlValue};

use crate::error::DriverError;

/// A fetched row: column name to value, in select-list order.
pub type Row = IndexMap<String, SqlValue>;

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// READ UNCOMMITTED.
    ReadUncommitted,
    /// READ COMMITTED.
    ReadCommitted,
    /// REPEATABLE READ.
    RepeatableRead,
    /// SERIALIZABLE.
    Serializable,
}

impl IsolationLevel {
    /// Returns the SQL spelling of the level.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

/// Begin / commit / rollback.
#[allow(async_fn_in_trait)]
pub trait TransactionBoundary {
    /// Starts a transaction, optionally at a given isolation level.
    async fn begin(&mut self, isolation: Option<IsolationLevel>) -> Result<(), DriverError>;

    /// Commits the open transaction.
    async fn commit(&mut self) -> Result<(), DriverError>;

    /// Rolls back the open transaction.
    async fn rollback(&mut self) -> Result<(), DriverError>;

    /// Returns whether a transaction is open.
    fn is_in_transaction(&self) -> bool;
}

/// Statement preparation, binding, execution and fetching.
#[allow(async_fn_in_trait)]
pub trait Driver: TransactionBoundary {
    /// A prepared statement handle.
    type Statement;

    /// Prepares `sql`.
    async fn prepare(&mut self, sql: &str) -> Result<Self::Statement, DriverError>;

    /// Binds one parameter, replacing any earlier value under the same key.
    fn bind_param(
        &mut self,
        statement: &mut Self::Statement,
        key: &ParamKey,
        param: &Param,
    ) -> Result<(), DriverError>;

    /// Executes the statement and returns the number of affected rows.
    async fn execute(&mut self, statement: &mut Self::Statement) -> Result<u64, DriverError>;

    /// Executes the statement and returns every row.
    async fn fetch_all(&mut self, statement: &mut Self::Statement) -> Result<Vec<Row>, DriverError>;

    /// Executes the statement and returns its first row.
    async fn fetch_row(
        &mut self,
        statement: &mut Self::Statement,
    ) -> Result<Option<Row>, DriverError> {
        Ok(self.fetch_all(statement).await?.into_iter().next())
    }

    /// Releases a statement handle.
    fn close(&mut self, statement: Self::Statement) {
        drop(statement);
    }
}
