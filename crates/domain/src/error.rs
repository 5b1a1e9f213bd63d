//! Domain error types.

use document_store::StoreError;
use thiserror::Error;

use crate::order::OrderError;

/// The failure categories callers act on.
///
/// Every [`DomainError`] collapses onto exactly one kind; transports map
/// kinds to their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Forbidden,
    Conflict,
    ServiceUnavailable,
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Malformed input, an unrecognized enum value, or a missing required field.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The caller is not allowed to perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A uniqueness rule was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An order rule was violated.
    #[error("Order error: {0}")]
    Order(OrderError),

    /// An error occurred in the document store.
    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    /// A stored document could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The file storage collaborator failed.
    #[error("File storage error: {0}")]
    FileStorage(#[from] std::io::Error),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Returns the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::InvalidArgument(_) | DomainError::Order(_) => ErrorKind::InvalidArgument,
            DomainError::Forbidden(_) => ErrorKind::Forbidden,
            DomainError::Conflict(_) | DomainError::Store(StoreError::DuplicateId { .. }) => {
                ErrorKind::Conflict
            }
            DomainError::Store(_) | DomainError::Serialization(_) | DomainError::FileStorage(_) => {
                ErrorKind::ServiceUnavailable
            }
        }
    }
}

impl From<OrderError> for DomainError {
    fn from(e: OrderError) -> Self {
        DomainError::Order(e)
    }
}
