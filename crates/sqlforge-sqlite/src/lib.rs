//! # sqlforge-sqlite
//!
//! SQLite driver for `sqlforge-command`, backed by `sqlx`.
//!
//! Named `:param` placeholders are rewritten to `?` with the same token
//! scanner the builder uses, so quoted text and comments are left alone.
//!
//! ```rust,no_run
//! use sqlforge_command::{ConnectionConfig, DialectKind};
//! use sqlforge_sqlite::SqliteDriver;
//!
//! # async fn run() -> sqlforge_command::Result<()> {
//! let config = ConnectionConfig::new("sqlite::memory:", DialectKind::Sqlite);
//! let mut conn = SqliteDriver::open(config).await?;
//! let tables = conn
//!     .create_command("SELECT COUNT(*) FROM sqlite_master")
//!     .query_scalar()
//!     .await?;
//! println!("{tables:?}");
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod error;
pub mod statement;

pub use driver::SqliteDriver;
pub use error::{Result, SqliteError};
pub use statement::SqliteStatement;
