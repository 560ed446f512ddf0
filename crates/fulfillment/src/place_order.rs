//! Idempotent order placement.

use std::collections::HashMap;
use std::time::Instant;

use common::{Money, ProductId, RecordId};
use domain::{FieldError, NewOrder, Order, OrderRepository, PlaceOrderRequest, group_line_items};
use idempotency::{Fingerprint, IdempotencyStore, IdempotencyStoreExt, SingleFlight};

use crate::config::WorkflowConfig;
use crate::error::{FulfillmentError, Result};
use crate::order_fulfillment;
use crate::services::{Availability, InventoryClient};

/// Places orders against the inventory service, converging repeated
/// requests with the same fingerprint on the first successful order.
pub struct OrderWorkflow<R, I, S>
where
    R: OrderRepository,
    I: InventoryClient,
    S: IdempotencyStore,
{
    orders: R,
    inventory: I,
    store: S,
    config: WorkflowConfig,
    flights: SingleFlight<Result<RecordId>>,
}

impl<R, I, S> OrderWorkflow<R, I, S>
where
    R: OrderRepository,
    I: InventoryClient,
    S: IdempotencyStore,
{
    /// Creates a workflow with the default configuration.
    pub fn new(orders: R, inventory: I, store: S) -> Self {
        Self::with_config(orders, inventory, store, WorkflowConfig::default())
    }

    pub fn with_config(orders: R, inventory: I, store: S, config: WorkflowConfig) -> Self {
        Self {
            orders,
            inventory,
            store,
            config,
            flights: SingleFlight::new(),
        }
    }

    pub fn config(&self) -> WorkflowConfig {
        self.config
    }

    pub fn orders(&self) -> &R {
        &self.orders
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order and returns its ID.
    ///
    /// A request whose user, product multiset and date match an earlier
    /// successful placement returns that placement's ID without touching
    /// inventory or storage.
    #[tracing::instrument(skip(self, request), fields(workflow = order_fulfillment::WORKFLOW_PLACE_ORDER))]
    pub async fn place_order(&self, request: &PlaceOrderRequest) -> Result<RecordId> {
        let started = Instant::now();
        let new_order = request.validate().map_err(FulfillmentError::Validation)?;
        let fingerprint = Fingerprint::for_order(
            &new_order.user_id,
            &new_order.product_ids,
            new_order.ordered_date,
        );

        let result = match self.cached(&fingerprint).await {
            Some(order_id) => Ok(order_id),
            None if self.config.single_flight => {
                self.flights
                    .run(&fingerprint, || self.execute(&fingerprint, &new_order))
                    .await
            }
            None => self.execute(&fingerprint, &new_order).await,
        };

        metrics::histogram!(
            "workflow_duration_seconds",
            "workflow" => order_fulfillment::WORKFLOW_PLACE_ORDER
        )
        .record(started.elapsed().as_secs_f64());
        result
    }

    /// Loads an order by ID.
    pub async fn get_order(&self, order_id: RecordId) -> Result<Order> {
        Ok(self.orders.get_order(order_id).await?)
    }

    async fn cached(&self, fingerprint: &Fingerprint) -> Option<RecordId> {
        let order: Order = self.store.get(fingerprint).await?;
        metrics::counter!(
            "idempotency_hits_total",
            "workflow" => order_fulfillment::WORKFLOW_PLACE_ORDER
        )
        .increment(1);
        tracing::info!(%fingerprint, order_id = %order.id, "returning previously placed order");
        Some(order.id)
    }

    async fn execute(&self, fingerprint: &Fingerprint, new_order: &NewOrder) -> Result<RecordId> {
        // A flight that finished between our lookup and registering ours
        // has already stored its result.
        if let Some(order_id) = self.cached(fingerprint).await {
            return Ok(order_id);
        }

        tracing::info!(step = order_fulfillment::STEP_CHECK_AVAILABILITY, "workflow step started");
        self.check_availability(&new_order.product_ids).await?;

        tracing::info!(step = order_fulfillment::STEP_PRICE_ORDER, "workflow step started");
        let total_price = self.price(&new_order.product_ids).await?;

        tracing::info!(step = order_fulfillment::STEP_PERSIST_ORDER, "workflow step started");
        let order = Order {
            id: RecordId::new(),
            user_id: new_order.user_id.clone(),
            product_ids: new_order.product_ids.clone(),
            total_price,
            ordered_date: new_order.ordered_date,
            status: new_order.status.clone(),
        };
        let order_id = self.orders.create_order(order.clone()).await?;

        if let Err(error) = self.store.set(fingerprint, &order).await {
            tracing::warn!(%fingerprint, %error, "failed to remember placed order");
        }

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(%order_id, %total_price, "order placed");
        Ok(order_id)
    }

    async fn check_availability(&self, product_ids: &[ProductId]) -> Result<()> {
        let items = group_line_items(product_ids);
        let availability = self.inventory.check_availability(&items).await?;
        let reported: HashMap<&ProductId, &Availability> = availability
            .iter()
            .map(|product| (&product.product_id, product))
            .collect();

        // Every requested product must be covered by the response.
        for item in &items {
            let product = reported.get(&item.product_id).ok_or_else(|| {
                FulfillmentError::remote(
                    order_fulfillment::SERVICE_INVENTORY,
                    format!("no availability returned for product {}", item.product_id),
                )
            })?;
            if !product.available || product.stock < i64::from(item.quantity) {
                return Err(FulfillmentError::Precondition(FieldError::new(
                    "product_id",
                    format!(
                        "product {} with id: {} is not available, stock is {}",
                        product.name, product.product_id, product.stock
                    ),
                )));
            }
        }
        Ok(())
    }

    /// Sums the unit price of every product occurrence.
    async fn price(&self, product_ids: &[ProductId]) -> Result<Money> {
        let distinct: Vec<ProductId> = group_line_items(product_ids)
            .into_iter()
            .map(|item| item.product_id)
            .collect();
        if distinct.is_empty() {
            return Ok(Money::zero());
        }

        let prices: HashMap<ProductId, Money> = self
            .inventory
            .get_unit_prices(&distinct)
            .await?
            .into_iter()
            .map(|unit| (unit.product_id, unit.price))
            .collect();

        product_ids
            .iter()
            .map(|product_id| {
                prices.get(product_id).copied().ok_or_else(|| {
                    FulfillmentError::remote(
                        order_fulfillment::SERVICE_INVENTORY,
                        format!("no price returned for product {product_id}"),
                    )
                })
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        AdjustmentOutcome, CatalogEntry, InMemoryInventory, StockAdjustment, UnitPrice,
    };
    use async_trait::async_trait;
    use domain::{InMemoryOrderRepository, LineItem};
    use idempotency::InMemoryIdempotencyStore;

    /// Inventory that leaves some products out of its availability answer.
    struct PartialInventory {
        inner: InMemoryInventory,
        omitted: ProductId,
    }

    #[async_trait]
    impl InventoryClient for PartialInventory {
        async fn check_availability(&self, items: &[LineItem]) -> Result<Vec<Availability>> {
            let mut availability = self.inner.check_availability(items).await?;
            availability.retain(|product| product.product_id != self.omitted);
            Ok(availability)
        }

        async fn get_unit_prices(&self, product_ids: &[ProductId]) -> Result<Vec<UnitPrice>> {
            self.inner.get_unit_prices(product_ids).await
        }

        async fn adjust_stock(&self, adjustments: &[StockAdjustment]) -> Result<AdjustmentOutcome> {
            self.inner.adjust_stock(adjustments).await
        }
    }

    fn workflow() -> OrderWorkflow<InMemoryOrderRepository, InMemoryInventory, InMemoryIdempotencyStore>
    {
        let inventory = InMemoryInventory::with_products([
            CatalogEntry::new("p1", "Widget", Money::from_dollars(20), 5),
            CatalogEntry::new("p2", "Gadget", Money::from_dollars(7), 1),
        ]);
        OrderWorkflow::new(
            InMemoryOrderRepository::new(),
            inventory,
            InMemoryIdempotencyStore::new(),
        )
    }

    fn request(products: &[&str]) -> PlaceOrderRequest {
        PlaceOrderRequest {
            user_id: "u1".to_string(),
            product_id: Some(products.iter().map(|p| p.to_string()).collect()),
            ordered_date: "2024-01-01".to_string(),
            status: "placed".to_string(),
        }
    }

    #[tokio::test]
    async fn total_counts_every_occurrence() {
        let workflow = workflow();
        let id = workflow.place_order(&request(&["p1", "p1", "p2"])).await.unwrap();

        let order = workflow.get_order(id).await.unwrap();
        assert_eq!(order.total_price, Money::from_dollars(47));
        assert_eq!(order.status, "placed");
    }

    #[tokio::test]
    async fn empty_product_list_places_a_zero_order() {
        let workflow = workflow();
        let id = workflow.place_order(&request(&[])).await.unwrap();

        let order = workflow.get_order(id).await.unwrap();
        assert!(order.total_price.is_zero());
        assert_eq!(workflow.inventory().price_lookups().await, 0);
    }

    #[tokio::test]
    async fn validation_failure_touches_nothing() {
        let workflow = workflow();
        let mut bad = request(&["p1"]);
        bad.user_id.clear();
        bad.ordered_date = "01/01/2024".to_string();

        let err = workflow.place_order(&bad).await.unwrap_err();
        let fields: Vec<_> = err.field_errors().into_iter().map(|f| f.field).collect();
        assert_eq!(fields, vec!["user_id", "ordered_date"]);
        assert_eq!(workflow.inventory().availability_checks().await, 0);
    }

    #[tokio::test]
    async fn unavailable_product_is_named_in_the_error() {
        let workflow = workflow();
        let err = workflow.place_order(&request(&["p2", "p2"])).await.unwrap_err();

        let FulfillmentError::Precondition(field) = &err else {
            panic!("expected precondition failure, got {err:?}");
        };
        assert_eq!(field.field, "product_id");
        assert!(field.message.contains("Gadget"));
        assert!(field.message.contains("stock is 1"));
        assert_eq!(workflow.orders().create_calls().await, 0);
    }

    #[tokio::test]
    async fn product_missing_from_availability_answer_fails_the_order() {
        let inventory = PartialInventory {
            inner: InMemoryInventory::with_products([
                CatalogEntry::new("p1", "Widget", Money::from_dollars(20), 5),
                CatalogEntry::new("p2", "Gadget", Money::from_dollars(7), 1),
            ]),
            omitted: ProductId::new("p2"),
        };
        let workflow = OrderWorkflow::new(
            InMemoryOrderRepository::new(),
            inventory,
            InMemoryIdempotencyStore::new(),
        );

        let err = workflow.place_order(&request(&["p1", "p2"])).await.unwrap_err();
        assert_eq!(
            err,
            FulfillmentError::remote("inventory", "no availability returned for product p2")
        );
        assert_eq!(workflow.orders().create_calls().await, 0);
        assert!(workflow.store().is_empty().await);
    }

    #[tokio::test]
    async fn storage_failure_leaves_no_idempotency_entry() {
        let workflow = workflow();
        workflow.orders().set_fail_writes(true).await;

        let err = workflow.place_order(&request(&["p1"])).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::Storage(_)));
        assert!(workflow.store().is_empty().await);
    }

    #[tokio::test]
    async fn get_unknown_order_is_not_found() {
        let workflow = workflow();
        let err = workflow.get_order(RecordId::new()).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::NotFound(_)));
    }
}
