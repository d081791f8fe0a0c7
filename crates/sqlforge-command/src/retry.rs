//! Retry policies for failed statement execution.
//!
//! The command owns the attempt counter. A policy only answers whether the
//! attempt that just failed should be followed by another one.

use crate::error::CommandError;

/// Decides whether a failed execution is retried.
pub trait RetryPolicy: Send + Sync {
    /// Called after attempt number `attempt` (starting at 1) failed with
    /// `error`. Returning true runs the statement again.
    fn should_retry(&self, error: &CommandError, attempt: u32) -> bool;
}

impl<F> RetryPolicy for F
where
    F: Fn(&CommandError, u32) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &CommandError, attempt: u32) -> bool {
        self(error, attempt)
    }
}

/// Retries driver failures until `max_attempts` attempts have been made.
///
/// Only failures that carry a driver error are retried; when `codes` is
/// not empty the driver's vendor code must also be one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxAttempts {
    max_attempts: u32,
    codes: Vec<String>,
}

impl MaxAttempts {
    /// Allows up to `max_attempts` attempts in total.
    #[must_use]
    pub const fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            codes: Vec::new(),
        }
    }

    /// Restricts retries to these vendor error codes.
    #[must_use]
    pub fn on_codes(mut self, codes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.codes = codes.into_iter().map(Into::into).collect();
        self
    }
}

impl RetryPolicy for MaxAttempts {
    fn should_retry(&self, error: &CommandError, attempt: u32) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }
        match error.driver_error() {
            Some(_) if self.codes.is_empty() => true,
            Some(driver) => driver
                .code
                .as_ref()
                .is_some_and(|code| self.codes.contains(code)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;

    fn busy() -> CommandError {
        CommandError::Execution {
            message: String::from("database is locked"),
            raw_sql: String::from("UPDATE t SET a = 1"),
            source: DriverError::new("database is locked").with_code("5"),
        }
    }

    #[test]
    fn test_closure_policy() {
        let policy = |_: &CommandError, attempt: u32| attempt < 2;
        assert!(policy.should_retry(&busy(), 1));
        assert!(!policy.should_retry(&busy(), 2));
    }

    #[test]
    fn test_max_attempts() {
        let policy = MaxAttempts::new(3);
        assert!(policy.should_retry(&busy(), 1));
        assert!(policy.should_retry(&busy(), 2));
        assert!(!policy.should_retry(&busy(), 3));
        let build = CommandError::Transaction(String::from("no"));
        assert!(!policy.should_retry(&build, 1));
    }

    #[test]
    fn test_max_attempts_with_codes() {
        assert!(MaxAttempts::new(3).on_codes(["5"]).should_retry(&busy(), 1));
        assert!(!MaxAttempts::new(3).on_codes(["40001"]).should_retry(&busy(), 1));
    }
}
