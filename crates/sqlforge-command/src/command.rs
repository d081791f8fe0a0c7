//! Command execution.
//!
//! A [`Command`] holds one SQL statement and its parameters, and runs it
//! through the connection's driver:
//!
//! ```text
//! Idle --prepare--> Prepared --execute--> Executed
//!                       |
//!                       +--query*--> ResultConsumed
//!
//! any --cancel--> Cancelled (prepares again on the next run)
//! ```
//!
//! Installing new SQL always resets the command first, so parameters,
//! the refresh marker, the isolation level and the retry policy never leak
//! from one statement to the next.

use std::sync::Arc;
use std::time::Duration;

use sqlforge_core::{
    raw_sql, Condition, InsertSource, Param, ParamKey, ParamType, Params, Query, QueryBuilder,
    SqlValue, Statement, ToSqlValue, UpsertUpdate, Value,
};
use tracing::{debug, info_span, warn, Instrument, Span};

use crate::cache::{CacheKey, QueryCache};
use crate::connection::Connection;
use crate::driver::{Driver, IsolationLevel, Row};
use crate::error::{CommandError, DriverError, Result};
use crate::mode::{DataReader, QueryMode, QueryResult};
use crate::retry::RetryPolicy;

/// Where a command is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommandState {
    /// No statement handle.
    #[default]
    Idle,
    /// A statement handle is ready.
    Prepared,
    /// The statement ran for an affected-row count.
    Executed,
    /// The statement's rows were fetched.
    ResultConsumed,
    /// The handle was discarded.
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum CacheSetting {
    /// Follow the connection's cache scope.
    #[default]
    Inherit,
    Enabled {
        duration: Option<Duration>,
        dependency: Option<String>,
    },
    Disabled,
}

/// One SQL statement bound to a connection.
pub struct Command<'c, D: Driver> {
    connection: &'c mut Connection<D>,
    sql: String,
    params: Params,
    refresh_table: Option<String>,
    isolation: Option<IsolationLevel>,
    retry: Option<Box<dyn RetryPolicy>>,
    cache: CacheSetting,
    statement: Option<D::Statement>,
    state: CommandState,
}

impl<'c, D: Driver> Command<'c, D> {
    pub(crate) fn new(connection: &'c mut Connection<D>) -> Self {
        Self {
            connection,
            sql: String::new(),
            params: Params::new(),
            refresh_table: None,
            isolation: None,
            retry: None,
            cache: CacheSetting::Inherit,
            statement: None,
            state: CommandState::Idle,
        }
    }

    /// Installs `sql` after resolving `{{table}}` and `[[column]]` markers.
    pub fn set_sql(&mut self, sql: &str) -> &mut Self {
        self.reset();
        self.sql = self.connection.builder.quote_sql(sql);
        self
    }

    /// Installs `sql` as is.
    pub fn set_raw_sql(&mut self, sql: impl Into<String>) -> &mut Self {
        self.reset();
        self.sql = sql.into();
        self
    }

    /// Installs a built statement. Statements that change data or schema
    /// run at the connection's configured isolation level.
    pub fn set_statement(&mut self, statement: Statement) -> &mut Self {
        self.reset();
        self.sql = statement.sql;
        self.params = statement.params;
        self.refresh_table = statement.refresh_table;
        self.isolation = self.connection.config.transaction_isolation;
        self
    }

    /// Builds and installs a SELECT.
    ///
    /// # Errors
    ///
    /// Returns a build error if the query is malformed.
    pub fn set_query(&mut self, query: &Query) -> Result<&mut Self> {
        let statement = self.connection.builder.build_query(query)?;
        self.reset();
        self.sql = statement.sql;
        self.params = statement.params;
        Ok(self)
    }

    /// Builds a statement with the connection's builder and installs it.
    ///
    /// ```rust,ignore
    /// command.build(|b| b.create_index("idx_user_email", "user", &["email"], true))?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the builder's error.
    pub fn build<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&QueryBuilder) -> sqlforge_core::Result<Statement>,
    {
        let statement = f(&self.connection.builder)?;
        Ok(self.set_statement(statement))
    }

    /// Installs an INSERT.
    ///
    /// # Errors
    ///
    /// Returns a build error if the source is malformed.
    pub fn insert(&mut self, table: &str, source: &InsertSource) -> Result<&mut Self> {
        self.build(|b| b.insert(table, source))
    }

    /// Installs a multi-row INSERT with inlined literals.
    ///
    /// # Errors
    ///
    /// Returns a build error if a row has the wrong width.
    pub fn batch_insert<S: AsRef<str>>(
        &mut self,
        table: &str,
        columns: &[S],
        rows: &[Vec<Value>],
    ) -> Result<&mut Self> {
        self.build(|b| b.batch_insert(table, columns, rows))
    }

    /// Installs an UPDATE.
    ///
    /// # Errors
    ///
    /// Returns a build error if there is nothing to set.
    pub fn update<K, V>(
        &mut self,
        table: &str,
        columns: impl IntoIterator<Item = (K, V)>,
        condition: Option<&Condition>,
        params: Params,
    ) -> Result<&mut Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.build(|b| b.update(table, columns, condition, params))
    }

    /// Installs a DELETE.
    ///
    /// # Errors
    ///
    /// Returns a build error if the condition is malformed.
    pub fn delete(
        &mut self,
        table: &str,
        condition: Option<&Condition>,
        params: Params,
    ) -> Result<&mut Self> {
        self.build(|b| b.delete(table, condition, params))
    }

    /// Installs an INSERT-or-update.
    ///
    /// # Errors
    ///
    /// Returns a build error if the dialect has no upsert syntax.
    pub fn upsert(
        &mut self,
        table: &str,
        insert: &InsertSource,
        update: &UpsertUpdate,
        conflict_target: &[&str],
    ) -> Result<&mut Self> {
        self.build(|b| b.upsert(table, insert, update, conflict_target))
    }

    /// Binds a value, letting the schema cache pick its type.
    pub fn bind_value(&mut self, name: impl Into<ParamKey>, value: impl ToSqlValue) -> &mut Self {
        let value = value.to_sql_value();
        let ty = self
            .connection
            .schema_cache
            .as_ref()
            .map_or_else(|| ParamType::infer(&value), |cache| cache.infer_type(&value));
        self.params.insert(name, Param::new(value, ty));
        self
    }

    /// Binds a value with an explicit type.
    pub fn bind_typed(
        &mut self,
        name: impl Into<ParamKey>,
        value: impl ToSqlValue,
        ty: ParamType,
    ) -> &mut Self {
        self.params.insert(name, Param::new(value, ty));
        self
    }

    /// Binds several values.
    pub fn bind_values<K, V>(&mut self, values: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<ParamKey>,
        V: ToSqlValue,
    {
        for (name, value) in values {
            self.bind_value(name, value);
        }
        self
    }

    /// Caches results of read queries. A `None` duration uses the
    /// configured default; `dependency` tags the entries for invalidation.
    pub fn cache(&mut self, duration: Option<Duration>, dependency: Option<&str>) -> &mut Self {
        self.cache = CacheSetting::Enabled {
            duration: duration.or_else(|| self.connection.config.query_cache_duration()),
            dependency: dependency.map(String::from),
        };
        self
    }

    /// Never serves or stores this command's results in the cache.
    pub fn no_cache(&mut self) -> &mut Self {
        self.cache = CacheSetting::Disabled;
        self
    }

    /// Runs [`Command::execute`] inside a transaction at `isolation`, unless
    /// one is already open.
    pub fn require_transaction(&mut self, isolation: IsolationLevel) -> &mut Self {
        self.isolation = Some(isolation);
        self
    }

    /// Installs the policy consulted when [`Command::execute`] fails.
    pub fn set_retry_policy(&mut self, policy: impl RetryPolicy + 'static) -> &mut Self {
        self.retry = Some(Box::new(policy));
        self
    }

    /// The SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The SQL text with parameters inlined, for logs and cache keys.
    pub fn raw_sql(&self) -> String {
        raw_sql(self.connection.builder.dialect(), &self.sql, &self.params)
    }

    /// The bound parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The lifecycle state.
    pub fn state(&self) -> CommandState {
        self.state
    }

    /// Discards the statement handle. Safe in any state.
    pub fn cancel(&mut self) {
        if let Some(statement) = self.statement.take() {
            self.connection.driver.close(statement);
        }
        self.state = CommandState::Cancelled;
    }

    /// Clears everything tied to the current statement.
    pub fn reset(&mut self) -> &mut Self {
        if let Some(statement) = self.statement.take() {
            self.connection.driver.close(statement);
        }
        self.sql.clear();
        self.params.clear();
        self.refresh_table = None;
        self.isolation = None;
        self.retry = None;
        self.state = CommandState::Idle;
        self
    }

    /// Prepares the statement. Does nothing when already prepared.
    ///
    /// # Errors
    ///
    /// Returns an execution error if the driver rejects the SQL.
    pub async fn prepare(&mut self) -> Result<()> {
        if self.statement.is_some() {
            return Ok(());
        }
        match self.connection.driver.prepare(&self.sql).await {
            Ok(statement) => {
                self.statement = Some(statement);
                self.state = CommandState::Prepared;
                Ok(())
            }
            Err(e) => Err(self.execution_error("Failed to prepare SQL", e)),
        }
    }

    /// Runs a statement that returns no rows.
    ///
    /// Empty SQL does nothing and reports 0 rows. A failure is retried while
    /// the retry policy allows it. After success the refresh table, if any,
    /// is dropped from the schema cache.
    ///
    /// # Errors
    ///
    /// Returns the last failure once the retry policy gives up.
    pub async fn execute(&mut self) -> Result<u64> {
        if self.sql.is_empty() {
            return Ok(0);
        }
        let span = self.span(QueryMode::Execute);
        self.execute_with_retry().instrument(span).await
    }

    /// Fetches every row.
    ///
    /// # Errors
    ///
    /// Returns an execution error if the driver fails.
    pub async fn query_all(&mut self) -> Result<Vec<Row>> {
        Ok(self.query_shaped(QueryMode::All).await?.into_rows())
    }

    /// Fetches the first row, or `None` when there is none.
    ///
    /// # Errors
    ///
    /// Returns an execution error if the driver fails.
    pub async fn query_one(&mut self) -> Result<Option<Row>> {
        Ok(self.query_shaped(QueryMode::Row).await?.into_row())
    }

    /// Fetches the first column of every row.
    ///
    /// # Errors
    ///
    /// Returns an execution error if the driver fails.
    pub async fn query_column(&mut self) -> Result<Vec<SqlValue>> {
        Ok(self.query_shaped(QueryMode::Column).await?.into_column())
    }

    /// Fetches the first column of the first row. Streams are read fully.
    ///
    /// # Errors
    ///
    /// Returns an execution error if the driver fails, or an IO error if a
    /// stream cannot be read.
    pub async fn query_scalar(&mut self) -> Result<Option<SqlValue>> {
        Ok(self.query_shaped(QueryMode::Scalar).await?.into_scalar())
    }

    /// Runs the query and returns a reader over its rows. Never cached.
    ///
    /// # Errors
    ///
    /// Returns an execution error if the driver fails.
    pub async fn query(&mut self) -> Result<DataReader> {
        if self.sql.is_empty() {
            return Ok(DataReader::default());
        }
        let span = self.span(QueryMode::Cursor);
        let rows = self.fetch(QueryMode::Cursor).instrument(span).await?;
        Ok(DataReader::new(rows))
    }

    async fn query_shaped(&mut self, mode: QueryMode) -> Result<QueryResult> {
        if self.sql.is_empty() {
            return Ok(QueryResult::empty(mode));
        }
        let span = self.span(mode);
        self.query_cached(mode).instrument(span).await
    }

    async fn query_cached(&mut self, mode: QueryMode) -> Result<QueryResult> {
        let cache = self.cache_target().map(|target| {
            let key = CacheKey::new(self.connection.config.dsn.clone(), self.raw_sql(), mode);
            (target, key)
        });
        if let Some(((cache, _, _), key)) = &cache {
            if let Some(hit) = cache.get(key) {
                debug!(target: "sqlforge::command", "query result served from cache");
                return Ok(hit);
            }
        }
        let rows = self.fetch(mode).await?;
        let result = QueryResult::shape(mode, rows)?;
        if let Some(((cache, duration, dependency), key)) = cache {
            cache.set(key, result.clone(), duration, dependency.as_deref());
            debug!(target: "sqlforge::command", "query result saved in cache");
        }
        Ok(result)
    }

    /// The cache to use for this command, with entry lifetime and tag.
    fn cache_target(&self) -> Option<(Arc<dyn QueryCache>, Option<Duration>, Option<String>)> {
        if !self.connection.config.enable_query_cache {
            return None;
        }
        let (duration, dependency) = match &self.cache {
            CacheSetting::Disabled => return None,
            CacheSetting::Enabled {
                duration,
                dependency,
            } => (*duration, dependency.clone()),
            CacheSetting::Inherit => {
                let scope = self.connection.cache_scope.as_ref()?;
                (scope.duration, scope.dependency.clone())
            }
        };
        let cache = Arc::clone(self.connection.query_cache.as_ref()?);
        Some((cache, duration, dependency))
    }

    async fn execute_with_retry(&mut self) -> Result<u64> {
        let mut attempt = 1;
        loop {
            match self.execute_once().await {
                Ok(count) => {
                    self.refresh_schema();
                    return Ok(count);
                }
                Err(error) => {
                    let retry = self
                        .retry
                        .as_ref()
                        .is_some_and(|policy| policy.should_retry(&error, attempt));
                    if !retry {
                        return Err(error);
                    }
                    warn!(target: "sqlforge::command", attempt, error = %error, "retrying statement");
                    attempt += 1;
                }
            }
        }
    }

    async fn execute_once(&mut self) -> Result<u64> {
        let owns_transaction = self.isolation.is_some() && !self.connection.is_in_transaction();
        if owns_transaction {
            self.connection.begin_transaction(self.isolation).await?;
        }
        let result = self.execute_statement().await;
        if !owns_transaction {
            return result;
        }
        let result = match result {
            Ok(count) => self.connection.commit().await.map(|()| count),
            Err(error) => Err(error),
        };
        if result.is_err() {
            self.rollback_quietly().await;
        }
        result
    }

    async fn rollback_quietly(&mut self) {
        if let Err(rollback) = self.connection.rollback().await {
            warn!(target: "sqlforge::command", error = %rollback, "rollback failed");
        }
    }

    async fn execute_statement(&mut self) -> Result<u64> {
        self.log();
        self.prepare().await?;
        match self.run_execute().await {
            Ok(count) => {
                self.state = CommandState::Executed;
                Ok(count)
            }
            Err(e) => {
                let error = self.execution_error("Failed to execute SQL", e);
                self.cancel();
                Err(error)
            }
        }
    }

    async fn run_execute(&mut self) -> std::result::Result<u64, DriverError> {
        self.bind_params()?;
        let statement = self.statement.as_mut().ok_or_else(not_prepared)?;
        self.connection.driver.execute(statement).await
    }

    async fn fetch(&mut self, mode: QueryMode) -> Result<Vec<Row>> {
        self.log();
        self.prepare().await?;
        match self.run_fetch(mode).await {
            Ok(rows) => {
                self.state = CommandState::ResultConsumed;
                Ok(rows)
            }
            Err(e) => {
                let error = self.execution_error("Failed to fetch rows", e);
                self.cancel();
                Err(error)
            }
        }
    }

    async fn run_fetch(&mut self, mode: QueryMode) -> std::result::Result<Vec<Row>, DriverError> {
        self.bind_params()?;
        let statement = self.statement.as_mut().ok_or_else(not_prepared)?;
        let driver = &mut self.connection.driver;
        match mode {
            QueryMode::Row | QueryMode::Scalar => {
                Ok(driver.fetch_row(statement).await?.into_iter().collect())
            }
            _ => driver.fetch_all(statement).await,
        }
    }

    fn bind_params(&mut self) -> std::result::Result<(), DriverError> {
        let statement = self.statement.as_mut().ok_or_else(not_prepared)?;
        for (key, param) in self.params.iter() {
            self.connection.driver.bind_param(statement, key, param)?;
        }
        Ok(())
    }

    fn refresh_schema(&self) {
        let (Some(table), Some(cache)) = (&self.refresh_table, &self.connection.schema_cache)
        else {
            return;
        };
        debug!(target: "sqlforge::command", table = %table, "refreshing table schema");
        cache.refresh_table(table);
    }

    fn execution_error(&self, context: &str, source: DriverError) -> CommandError {
        CommandError::Execution {
            message: format!("{context}: {source}"),
            raw_sql: self.raw_sql(),
            source,
        }
    }

    fn log(&self) {
        if self.connection.config.enable_logging {
            debug!(target: "sqlforge::command", sql = %self.raw_sql(), "executing SQL");
        }
    }

    fn span(&self, mode: QueryMode) -> Span {
        if self.connection.config.enable_profiling {
            info_span!(target: "sqlforge::command", "sqlforge.query", mode = ?mode, sql = %self.sql)
        } else {
            Span::none()
        }
    }
}

impl<D: Driver> Drop for Command<'_, D> {
    fn drop(&mut self) {
        if let Some(statement) = self.statement.take() {
            self.connection.driver.close(statement);
        }
    }
}

fn not_prepared() -> DriverError {
    DriverError::new("statement is not prepared")
}
