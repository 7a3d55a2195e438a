use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::data::store::error::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed request: missing or misconfigured request group, empty
    /// resources map, unknown resource class, amount below one.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A required trait name is not in the catalog.
    #[error("Unknown trait: {0}")]
    UnknownTrait(String),

    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The computation was abandoned mid-flight.
    #[error("Operation cancelled")]
    Cancelled,

    /// An engine-internal invariant broke, e.g. a candidate referencing a
    /// provider the snapshot never loaded.
    #[error("Internal error")]
    Internal,

    /// A store read failed. The caller may retry; the engine does not.
    #[error("Store error: {0}")]
    Store(RepositoryError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        // A connection torn down underneath an in-flight read means the
        // caller went away, not that the store is unhealthy.
        match err {
            RepositoryError::Database(DieselError::DatabaseError(
                DatabaseErrorKind::ClosedConnection,
                _,
            )) => Error::Cancelled,
            other => Error::Store(other),
        }
    }
}
