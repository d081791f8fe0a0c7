//! Error types for the SQLite driver.

use sqlforge_command::DriverError;
use thiserror::Error;

/// SQLite driver errors.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stream parameter could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A placeholder has no bound value.
    #[error("no value bound for parameter {0}")]
    MissingParam(String),
}

impl From<SqliteError> for DriverError {
    fn from(error: SqliteError) -> Self {
        match &error {
            SqliteError::Database(sqlx::Error::Database(db)) => {
                let driver = Self::new(db.message());
                match db.code() {
                    Some(code) => driver.with_code(code),
                    None => driver,
                }
            }
            _ => Self::new(error.to_string()),
        }
    }
}

/// Result type alias for SQLite driver operations.
pub type Result<T> = std::result::Result<T, SqliteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_param_message() {
        let driver: DriverError = SqliteError::MissingParam(String::from(":id")).into();
        assert_eq!(driver.message, "no value bound for parameter :id");
        assert_eq!(driver.code, None);
    }
}
