//! A database connection: driver, configuration and shared caches.

use std::sync::Arc;
use std::time::Duration;

use sqlforge_core::QueryBuilder;
use tracing::debug;

use crate::cache::{MemoryQueryCache, QueryCache};
use crate::command::Command;
use crate::config::ConnectionConfig;
use crate::driver::{Driver, IsolationLevel};
use crate::error::{CommandError, Result};
use crate::schema::SchemaCache;

/// Connection-wide cache settings opened by [`Connection::begin_cache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CacheScope {
    pub(crate) duration: Option<Duration>,
    pub(crate) dependency: Option<String>,
}

/// Owns a driver and the state every command created from it shares.
pub struct Connection<D: Driver> {
    pub(crate) driver: D,
    pub(crate) config: ConnectionConfig,
    pub(crate) builder: QueryBuilder,
    pub(crate) query_cache: Option<Arc<dyn QueryCache>>,
    pub(crate) schema_cache: Option<Arc<dyn SchemaCache>>,
    pub(crate) cache_scope: Option<CacheScope>,
}

impl<D: Driver> Connection<D> {
    /// Wraps `driver` with an in-memory query cache and no schema cache.
    pub fn new(driver: D, config: ConnectionConfig) -> Self {
        let builder = config.query_builder();
        Self {
            driver,
            config,
            builder,
            query_cache: Some(Arc::new(MemoryQueryCache::new())),
            schema_cache: None,
            cache_scope: None,
        }
    }

    /// Replaces the query cache.
    #[must_use]
    pub fn with_query_cache(mut self, cache: Arc<dyn QueryCache>) -> Self {
        self.query_cache = Some(cache);
        self
    }

    /// Sets the schema cache refreshed after structure-changing statements.
    #[must_use]
    pub fn with_schema_cache(mut self, cache: Arc<dyn SchemaCache>) -> Self {
        self.schema_cache = Some(cache);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Returns the statement builder for this connection's dialect.
    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// Returns the driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Returns the driver mutably.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Returns the query cache.
    pub fn query_cache(&self) -> Option<&Arc<dyn QueryCache>> {
        self.query_cache.as_ref()
    }

    /// Creates a command for `sql`. Table and column markers are resolved.
    pub fn create_command(&mut self, sql: &str) -> Command<'_, D> {
        let mut command = Command::new(self);
        command.set_sql(sql);
        command
    }

    /// Caches every read query run until [`Connection::end_cache`], unless
    /// a command opts out. A `None` duration uses the configured default.
    pub fn begin_cache(&mut self, duration: Option<Duration>, dependency: Option<&str>) {
        self.cache_scope = Some(CacheScope {
            duration: duration.or_else(|| self.config.query_cache_duration()),
            dependency: dependency.map(String::from),
        });
    }

    /// Ends the scope opened by [`Connection::begin_cache`].
    pub fn end_cache(&mut self) {
        self.cache_scope = None;
    }

    /// Largest number of bound parameters a single statement may carry.
    pub fn max_bound_params(&self) -> usize {
        self.config
            .max_bound_params
            .unwrap_or_else(|| self.builder.dialect().max_bound_params())
    }

    /// Begins a transaction.
    ///
    /// # Errors
    ///
    /// Returns a transaction error if the driver fails.
    pub async fn begin_transaction(&mut self, isolation: Option<IsolationLevel>) -> Result<()> {
        debug!(isolation = ?isolation, "beginning transaction");
        self.driver
            .begin(isolation)
            .await
            .map_err(|e| CommandError::Transaction(format!("failed to begin transaction: {e}")))
    }

    /// Commits the open transaction.
    ///
    /// # Errors
    ///
    /// Returns a transaction error if the driver fails.
    pub async fn commit(&mut self) -> Result<()> {
        debug!("committing transaction");
        self.driver
            .commit()
            .await
            .map_err(|e| CommandError::Transaction(format!("failed to commit transaction: {e}")))
    }

    /// Rolls back the open transaction.
    ///
    /// # Errors
    ///
    /// Returns a transaction error if the driver fails.
    pub async fn rollback(&mut self) -> Result<()> {
        debug!("rolling back transaction");
        self.driver
            .rollback()
            .await
            .map_err(|e| CommandError::Transaction(format!("failed to roll back transaction: {e}")))
    }

    /// Returns whether a transaction is open.
    pub fn is_in_transaction(&self) -> bool {
        self.driver.is_in_transaction()
    }
}
