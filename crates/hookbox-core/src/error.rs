//! Storage-layer error taxonomy.

use thiserror::Error;

/// Result alias for storage operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors the storage engine can surface.
///
/// Every variant terminates the operation that produced it; none is used
/// for control flow.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The backing medium cannot complete a read or write.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A filter parameter is outside its declared domain.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("requested record not found".to_string()),
            other => Self::Unavailable(other.to_string()),
        }
    }
}
