//! Persistence gateway error types.

use common::RecordId;
use thiserror::Error;

/// Errors returned by the order and payment persistence gateways.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// The requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: RecordId },

    /// A record with the same ID was already written.
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: RecordId },

    /// The storage backend failed.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl PersistenceError {
    /// Returns true for the distinguished "not found" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PersistenceError::NotFound { .. })
    }
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
