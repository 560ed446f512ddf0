//! Request fingerprints used as idempotency keys.

use chrono::NaiveDate;
use common::{ProductId, RecordId, UserId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Deterministic digest of a request's semantically significant fields.
///
/// Fingerprints are derived from request content, never from a
/// client-supplied token, so a retried request maps to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint for an order placement.
    ///
    /// Product IDs are sorted first so that reordered but otherwise
    /// identical requests collapse to the same key. Duplicates are kept, so
    /// `[A, A]` and `[A]` differ.
    pub fn for_order(user_id: &UserId, product_ids: &[ProductId], ordered_date: NaiveDate) -> Self {
        let mut sorted: Vec<&ProductId> = product_ids.iter().collect();
        sorted.sort();

        let mut hasher = Sha256::new();
        write_field(&mut hasher, user_id.as_str());
        write_len(&mut hasher, sorted.len());
        for product_id in sorted {
            write_field(&mut hasher, product_id.as_str());
        }
        write_field(&mut hasher, &ordered_date.to_string());

        Self(hex::encode(hasher.finalize()))
    }

    /// Fingerprint for a payment: the order ID itself, allowing at most one
    /// successful payment per order.
    pub fn for_payment(order_id: RecordId) -> Self {
        Self(order_id.to_string())
    }

    /// Wraps an already computed key.
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Length-prefixed so that field boundaries cannot be forged by the content.
fn write_field(hasher: &mut Sha256, value: &str) {
    write_len(hasher, value.len());
    hasher.update(value.as_bytes());
}

fn write_len(hasher: &mut Sha256, len: usize) {
    hasher.update((len as u64).to_le_bytes());
}
