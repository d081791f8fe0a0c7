//! Error types for command execution.

use sqlforge_core::BuildError;

/// A failure reported by a database driver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DriverError {
    /// Driver message.
    pub message: String,
    /// Vendor error code, when the driver reports one.
    pub code: Option<String>,
}

impl DriverError {
    /// Creates a driver error without a vendor code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Attaches a vendor error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Errors raised by commands and connections.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The statement could not be built.
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// The driver rejected or failed the statement.
    #[error("{message}\nThe SQL being executed was: {raw_sql}")]
    Execution {
        /// What failed.
        message: String,
        /// The statement with its parameters inlined.
        raw_sql: String,
        /// The driver's own error.
        #[source]
        source: DriverError,
    },

    /// A driver call outside statement execution failed.
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// Beginning, committing or rolling back a transaction failed.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// A result stream could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl CommandError {
    /// The driver error behind this error, if any.
    #[must_use]
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Self::Execution { source, .. } | Self::Driver(source) => Some(source),
            _ => None,
        }
    }
}

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, CommandError>;
