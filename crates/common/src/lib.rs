//! Shared identifiers and value objects used across the fulfillment services.

pub mod types;

pub use types::{Money, ProductId, RecordId, UserId};
