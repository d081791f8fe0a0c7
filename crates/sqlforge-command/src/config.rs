//! Connection configuration.
//!
//! ```json
//! {
//!     "dsn": "sqlite::memory:",
//!     "dialect": "sqlite",
//!     "table_prefix": "app_",
//!     "enable_query_cache": true,
//!     "query_cache_duration_secs": 60
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use sqlforge_core::{
    Dialect, GenericDialect, MysqlDialect, PostgresDialect, QueryBuilder, SqliteDialect,
};

use crate::driver::IsolationLevel;
use crate::error::Result;

/// Which SQL dialect a connection speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// ANSI-flavoured SQL with no vendor extensions.
    #[default]
    Generic,
    /// SQLite.
    Sqlite,
    /// PostgreSQL.
    #[serde(alias = "postgresql", alias = "pgsql")]
    Postgres,
    /// MySQL / MariaDB.
    #[serde(alias = "mariadb")]
    Mysql,
}

impl DialectKind {
    /// Creates the dialect.
    #[must_use]
    pub fn dialect(self) -> Arc<dyn Dialect> {
        match self {
            Self::Generic => Arc::new(GenericDialect::new()),
            Self::Sqlite => Arc::new(SqliteDialect::new()),
            Self::Postgres => Arc::new(PostgresDialect::new()),
            Self::Mysql => Arc::new(MysqlDialect::new()),
        }
    }
}

/// Settings shared by every command created from a connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Data source name, also part of every query cache key.
    pub dsn: String,
    /// SQL dialect.
    pub dialect: DialectKind,
    /// Substituted for `%` in `{{%table}}` markers.
    pub table_prefix: String,
    /// Whether query results may be cached at all.
    pub enable_query_cache: bool,
    /// Default cache lifetime. `None` caches until invalidated.
    pub query_cache_duration_secs: Option<u64>,
    /// Overrides the dialect's bound-parameter limit for batch inserts.
    pub max_bound_params: Option<usize>,
    /// Log every executed statement.
    pub enable_logging: bool,
    /// Wrap every execution in a tracing span.
    pub enable_profiling: bool,
    /// Isolation level for statements that require a transaction.
    pub transaction_isolation: Option<IsolationLevel>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            dialect: DialectKind::default(),
            table_prefix: String::new(),
            enable_query_cache: true,
            query_cache_duration_secs: Some(3600),
            max_bound_params: None,
            enable_logging: true,
            enable_profiling: true,
            transaction_isolation: None,
        }
    }
}

impl ConnectionConfig {
    /// Creates a config for `dsn` with default settings.
    #[must_use]
    pub fn new(dsn: impl Into<String>, dialect: DialectKind) -> Self {
        Self {
            dsn: dsn.into(),
            dialect,
            ..Self::default()
        }
    }

    /// Parses a JSON config.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or has unknown values.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Creates the configured dialect.
    #[must_use]
    pub fn dialect(&self) -> Arc<dyn Dialect> {
        self.dialect.dialect()
    }

    /// Creates a builder for the configured dialect and table prefix.
    #[must_use]
    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new(self.dialect()).with_table_prefix(self.table_prefix.clone())
    }

    /// Default query cache lifetime.
    #[must_use]
    pub fn query_cache_duration(&self) -> Option<Duration> {
        self.query_cache_duration_secs.map(Duration::from_secs)
    }
}
