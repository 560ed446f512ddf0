use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Fingerprint, IdempotencyError, Result};

/// Core trait for idempotency store implementations.
///
/// A store maps a fingerprint to the encoded result of the first successful
/// run of a workflow. Values are opaque bytes; the store never interprets
/// them. Individual reads and writes are atomic, but nothing serializes a
/// read followed by a later write for the same key.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Returns the raw entry for a fingerprint, if any.
    async fn load(&self, fingerprint: &Fingerprint) -> Option<Vec<u8>>;

    /// Writes the raw entry for a fingerprint, replacing any previous value.
    async fn save(&self, fingerprint: &Fingerprint, value: Vec<u8>) -> Result<()>;
}

/// Typed access on top of [`IdempotencyStore`].
#[async_trait]
pub trait IdempotencyStoreExt: IdempotencyStore {
    /// Looks up and decodes a cached result.
    ///
    /// An entry that fails to decode is treated as a miss.
    async fn get<T>(&self, fingerprint: &Fingerprint) -> Option<T>
    where
        T: DeserializeOwned + Send,
    {
        let bytes = self.load(fingerprint).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(%fingerprint, %error, "discarding undecodable idempotency entry");
                metrics::counter!("idempotency_decode_failures_total").increment(1);
                None
            }
        }
    }

    /// Encodes and stores a result under the fingerprint.
    async fn set<T>(&self, fingerprint: &Fingerprint, value: &T) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let bytes = serde_json::to_vec(value).map_err(|source| IdempotencyError::Encode {
            fingerprint: fingerprint.clone(),
            source,
        })?;
        self.save(fingerprint, bytes).await
    }
}

// Blanket implementation for all IdempotencyStore implementations
impl<T: IdempotencyStore + ?Sized> IdempotencyStoreExt for T {}
