//! HTTP API server for the fulfillment workflows.
//!
//! Exposes order placement and payment recording, read endpoints for both
//! records, a health check and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{InMemoryOrderRepository, InMemoryPaymentRepository};
use fulfillment::{
    CatalogEntry, InMemoryInventory, OrderWorkflow, PaymentWorkflow, RepositoryOrderClient,
    WorkflowConfig,
};
use idempotency::InMemoryIdempotencyStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::place))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/payments", post(routes::payments::record))
        .route("/payments/{id}", get(routes::payments::get))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires both workflows over in-memory stores and an inventory seeded with
/// `catalog`.
///
/// The payment workflow's order client reads and updates the same order
/// store the order workflow writes to. Each workflow has its own
/// idempotency store.
pub fn create_default_state(
    config: WorkflowConfig,
    catalog: impl IntoIterator<Item = CatalogEntry>,
) -> Arc<AppState> {
    let orders = InMemoryOrderRepository::new();
    let inventory = InMemoryInventory::with_products(catalog);

    let order_workflow = OrderWorkflow::with_config(
        orders.clone(),
        inventory.clone(),
        InMemoryIdempotencyStore::new(),
        config,
    );
    let payment_workflow = PaymentWorkflow::with_config(
        InMemoryPaymentRepository::new(),
        RepositoryOrderClient::new(Arc::new(orders)),
        inventory,
        InMemoryIdempotencyStore::new(),
        config,
    );

    Arc::new(AppState {
        orders: order_workflow,
        payments: payment_workflow,
    })
}
