//! Idempotent cross-service fulfillment workflows.
//!
//! Orders, inventory and payments live in separate services with no shared
//! transaction. This crate coordinates them through two short pipelines:
//!
//! - **Place order**: check availability → price the order → persist it
//! - **Record payment**: persist the payment → mark the order pending →
//!   decrement stock → mark the order completed
//!
//! Both are fronted by an idempotency store keyed by a request fingerprint,
//! so retried or duplicate requests converge on the first successful result
//! instead of charging, reserving or writing twice. Payment side effects are
//! best-effort: there is no compensation once the payment row is committed.

pub mod config;
pub mod error;
pub mod order_fulfillment;
pub mod place_order;
pub mod record_payment;
pub mod services;

pub use config::WorkflowConfig;
pub use error::FulfillmentError;
pub use place_order::OrderWorkflow;
pub use record_payment::PaymentWorkflow;
pub use services::{
    AdjustmentOutcome, Availability, CatalogEntry, InMemoryInventory, InventoryClient, OrderClient,
    RepositoryOrderClient, StockAdjustment, StockDirection, UnitPrice,
};
