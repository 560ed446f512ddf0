//! Idempotency primitives for the fulfillment workflows.
//!
//! - [`Fingerprint`]: deterministic key derived from a request's meaningful fields
//! - [`IdempotencyStore`]: maps fingerprints to the first successful result
//! - [`SingleFlight`]: coalesces concurrent executions for the same fingerprint

pub mod error;
pub mod fingerprint;
pub mod memory;
pub mod single_flight;
pub mod store;

pub use error::{IdempotencyError, Result};
pub use fingerprint::Fingerprint;
pub use memory::InMemoryIdempotencyStore;
pub use single_flight::SingleFlight;
pub use store::{IdempotencyStore, IdempotencyStoreExt};
