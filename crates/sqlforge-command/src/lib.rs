//! # sqlforge-command
//!
//! Runs statements built by `sqlforge-core` against a database driver.
//!
//! A [`Connection`] owns a [`Driver`], its [`ConnectionConfig`] and the
//! shared query and schema caches. Each [`Command`] borrows the connection
//! for one statement at a time and:
//!
//! - prepares, binds and runs the statement in the requested [`QueryMode`]
//! - serves read results from the [`QueryCache`] when caching is on
//! - retries failed executions under a [`RetryPolicy`]
//! - wraps execution in a transaction when an isolation level is required
//! - refreshes the [`SchemaCache`] after statements that change a table
//!
//! Drivers implement [`Driver`] and [`TransactionBoundary`]. Execution is
//! logged and profiled through `tracing`.

pub mod batch;
pub mod cache;
pub mod command;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod mode;
pub mod retry;
pub mod schema;

pub use cache::{CacheKey, MemoryQueryCache, QueryCache, DEFAULT_CACHE_CAPACITY};
pub use command::{Command, CommandState};
pub use config::{ConnectionConfig, DialectKind};
pub use connection::Connection;
pub use driver::{Driver, IsolationLevel, Row, TransactionBoundary};
pub use error::{CommandError, DriverError, Result};
pub use mode::{DataReader, QueryMode, QueryResult};
pub use retry::{MaxAttempts, RetryPolicy};
pub use schema::{MemorySchemaCache, SchemaCache};
