//! Error types for store operations.

use thiserror::Error;

/// Failures that can occur while reading from or (in tests) writing to
/// the placement store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database operation error from diesel
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Connection pool error
    #[error("Pool error: {0}")]
    Pool(String),

    /// Entity not found error
    #[error("Not found: {entity}")]
    NotFound {
        /// The type of entity that was not found
        entity: String,
    },

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RepositoryError {
    /// Create a new NotFound error for the given entity type.
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }

    /// Create a new InvalidInput error with the given message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Check if this error represents a not found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Type alias for Results that may fail with RepositoryError
pub type RepositoryResult<T> = Result<T, RepositoryError>;
