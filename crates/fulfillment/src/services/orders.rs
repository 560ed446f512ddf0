//! Order service client used by the payment workflow.

use std::sync::Arc;

use async_trait::async_trait;
use common::{ProductId, RecordId};
use domain::{OrderRepository, PersistenceError};

use crate::error::FulfillmentError;
use crate::order_fulfillment::SERVICE_ORDERS;

/// Trait for order service operations.
#[async_trait]
pub trait OrderClient: Send + Sync {
    /// Returns the order's product IDs, one entry per unit ordered.
    async fn get_order_product_ids(
        &self,
        order_id: RecordId,
    ) -> Result<Vec<ProductId>, FulfillmentError>;

    /// Sets the order's status marker. Returns false if the service
    /// accepted the call but did not apply it.
    async fn update_order_status(
        &self,
        order_id: RecordId,
        status: &str,
    ) -> Result<bool, FulfillmentError>;
}

/// Order client backed directly by an order repository.
#[derive(Debug)]
pub struct RepositoryOrderClient<R> {
    repository: Arc<R>,
}

impl<R> Clone for RepositoryOrderClient<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: OrderRepository> RepositoryOrderClient<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

/// Every order service failure is a server error: the payment workflow only
/// calls the order service after its own payment row is committed.
fn map_error(order_id: RecordId, err: PersistenceError) -> FulfillmentError {
    let reason = if err.is_not_found() {
        format!("order with id: {order_id} not found")
    } else {
        err.to_string()
    };
    FulfillmentError::remote(SERVICE_ORDERS, reason)
}

#[async_trait]
impl<R: OrderRepository> OrderClient for RepositoryOrderClient<R> {
    async fn get_order_product_ids(
        &self,
        order_id: RecordId,
    ) -> Result<Vec<ProductId>, FulfillmentError> {
        self.repository
            .get_order_product_ids(order_id)
            .await
            .map_err(|err| map_error(order_id, err))
    }

    async fn update_order_status(
        &self,
        order_id: RecordId,
        status: &str,
    ) -> Result<bool, FulfillmentError> {
        self.repository
            .update_order_status(order_id, status)
            .await
            .map_err(|err| map_error(order_id, err))?;
        Ok(true)
    }
}
