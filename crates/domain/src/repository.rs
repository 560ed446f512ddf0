//! Persistence gateway traits.
//!
//! The order and payment services each own their storage; these traits are
//! the narrow surface the fulfillment workflows need from it.

use async_trait::async_trait;
use common::{ProductId, RecordId};

use crate::Result;
use crate::order::Order;
use crate::payment::Payment;

/// Durable storage for orders and their line items.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists a new order.
    ///
    /// Implementations also write one (product, quantity) line item per
    /// distinct product in the order.
    async fn create_order(&self, order: Order) -> Result<RecordId>;

    /// Loads an order, rebuilding its product list from the line items.
    async fn get_order(&self, id: RecordId) -> Result<Order>;

    /// Replaces the status of an existing order.
    async fn update_order_status(&self, id: RecordId, status: &str) -> Result<()>;

    /// Returns the order's product IDs, one entry per unit ordered.
    async fn get_order_product_ids(&self, id: RecordId) -> Result<Vec<ProductId>> {
        Ok(self.get_order(id).await?.product_ids)
    }
}

/// Durable storage for payments.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Persists a new payment.
    async fn create_payment(&self, payment: Payment) -> Result<RecordId>;

    /// Loads a payment by ID.
    async fn get_payment(&self, id: RecordId) -> Result<Payment>;
}
