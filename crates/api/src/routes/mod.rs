//! HTTP handlers and the state they share.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;

use axum::http::StatusCode;
use common::RecordId;
use domain::{InMemoryOrderRepository, InMemoryPaymentRepository};
use fulfillment::{InMemoryInventory, OrderWorkflow, PaymentWorkflow, RepositoryOrderClient};
use idempotency::InMemoryIdempotencyStore;

use crate::error::ApiError;

/// Order placement workflow as wired by this server.
pub type AppOrderWorkflow =
    OrderWorkflow<InMemoryOrderRepository, InMemoryInventory, InMemoryIdempotencyStore>;

/// Payment recording workflow as wired by this server.
pub type AppPaymentWorkflow = PaymentWorkflow<
    InMemoryPaymentRepository,
    RepositoryOrderClient<InMemoryOrderRepository>,
    InMemoryInventory,
    InMemoryIdempotencyStore,
>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orders: AppOrderWorkflow,
    pub payments: AppPaymentWorkflow,
}

/// A workflow result ID, returned as plain text.
pub(crate) fn id_response(id: RecordId) -> (StatusCode, String) {
    (StatusCode::OK, id.to_string())
}

pub(crate) fn parse_record_id(id: &str) -> Result<RecordId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::invalid("id", format!("malformed id: {id}")))
}
