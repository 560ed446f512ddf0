//! Domain layer for the fulfillment services.
//!
//! This crate provides:
//! - Order and Payment records as they are persisted by their owning services
//! - Line-item grouping and the order status markers used by fulfillment
//! - Request validation producing per-field errors
//! - Persistence gateway traits with in-memory implementations

pub mod error;
pub mod memory;
pub mod order;
pub mod payment;
pub mod repository;
pub mod validation;

pub use common::{Money, ProductId, RecordId, UserId};
pub use error::{PersistenceError, Result};
pub use memory::{InMemoryOrderRepository, InMemoryPaymentRepository};
pub use order::{
    LineItem, NewOrder, Order, PlaceOrderRequest, STATUS_COMPLETED, STATUS_PENDING, STATUS_PLACED,
    group_line_items,
};
pub use payment::{NewPayment, Payment, RecordPaymentRequest};
pub use repository::{OrderRepository, PaymentRepository};
pub use validation::{DATE_FORMAT, FieldError, parse_date};
