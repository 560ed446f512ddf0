//! Fulfillment error types.

use domain::{FieldError, PersistenceError};
use thiserror::Error;

/// Errors that can occur while running a fulfillment workflow.
///
/// Cloneable so that callers coalesced onto a single in-flight execution
/// all receive the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FulfillmentError {
    /// Malformed or missing request fields. Never retried automatically.
    #[error("Validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// A precondition on another service does not hold, e.g. insufficient
    /// stock or an unknown order. Nothing has been written.
    #[error("Precondition failed: {0}")]
    Precondition(FieldError),

    /// A record requested by ID does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A call to the inventory or order service failed.
    #[error("{service} service error: {reason}")]
    Remote {
        service: &'static str,
        reason: String,
    },

    /// The persistence gateway failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl FulfillmentError {
    pub fn remote(service: &'static str, reason: impl Into<String>) -> Self {
        FulfillmentError::Remote {
            service,
            reason: reason.into(),
        }
    }

    /// Returns true for failures caused by the request itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FulfillmentError::Validation(_) | FulfillmentError::Precondition(_)
        )
    }

    /// Per-field errors for client failures; empty for server-side failures,
    /// which are reported as a single opaque message.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            FulfillmentError::Validation(errors) => errors.clone(),
            FulfillmentError::Precondition(error) => vec![error.clone()],
            _ => Vec::new(),
        }
    }
}

impl From<PersistenceError> for FulfillmentError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound { .. } => FulfillmentError::NotFound(err.to_string()),
            _ => FulfillmentError::Storage(err.to_string()),
        }
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
