//! Error types for statement building.

/// Errors raised while turning a structured description into SQL.
///
/// These are always reported by the builder call itself, before any SQL
/// text is handed out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// The structured input cannot be rendered unambiguously.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The target dialect has no syntax for the requested operation.
    #[error("{operation} is not supported by the {dialect} dialect")]
    NotSupported {
        /// Dialect name.
        dialect: &'static str,
        /// Operation that was requested.
        operation: &'static str,
    },
}

impl BuildError {
    /// Creates an [`BuildError::InvalidArgument`] error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Result type for builder operations.
pub type Result<T> = std::result::Result<T, BuildError>;
