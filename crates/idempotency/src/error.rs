use thiserror::Error;

use crate::Fingerprint;

/// Errors that can occur when writing to an idempotency store.
///
/// Reads never fail: an entry that cannot be decoded is reported as a miss.
#[derive(Debug, Error)]
pub enum IdempotencyError {
    /// The value could not be encoded for storage.
    #[error("Failed to encode idempotency entry {fingerprint}: {source}")]
    Encode {
        fingerprint: Fingerprint,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for idempotency store operations.
pub type Result<T> = std::result::Result<T, IdempotencyError>;
