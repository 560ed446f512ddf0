//! Inventory client trait and in-memory inventory service.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{Money, ProductId};
use domain::{FieldError, LineItem};
use serde::{Deserialize, Serialize};
use tokio::sync::{Barrier, RwLock};

use crate::error::FulfillmentError;
use crate::order_fulfillment::SERVICE_INVENTORY;

/// Availability of one requested product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub product_id: ProductId,
    /// True when current stock covers the requested quantity.
    pub available: bool,
    pub stock: i64,
    pub name: String,
}

/// Unit price of one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPrice {
    pub product_id: ProductId,
    pub price: Money,
}

/// Direction of a stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockDirection {
    Increment,
    Decrement,
}

/// One element of a batched stock adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub quantity: u32,
    pub direction: StockDirection,
}

impl StockAdjustment {
    pub fn increment(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            direction: StockDirection::Increment,
        }
    }

    pub fn decrement(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            direction: StockDirection::Decrement,
        }
    }
}

/// Structured result of a batched adjustment.
///
/// Insufficient stock is an outcome, not an error: `success` is false and
/// `rejected` names the decrements that were not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentOutcome {
    pub success: bool,
    pub message: String,
    pub rejected: Vec<ProductId>,
}

/// Trait for inventory service operations.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Reports, for each line item, whether stock covers its quantity.
    async fn check_availability(
        &self,
        items: &[LineItem],
    ) -> Result<Vec<Availability>, FulfillmentError>;

    /// Returns the unit price of each distinct product.
    async fn get_unit_prices(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Vec<UnitPrice>, FulfillmentError>;

    /// Applies a batch of stock adjustments.
    async fn adjust_stock(
        &self,
        adjustments: &[StockAdjustment],
    ) -> Result<AdjustmentOutcome, FulfillmentError>;
}

/// A product known to the inventory service.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub stock: i64,
}

impl CatalogEntry {
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money,
        stock: i64,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            stock,
        }
    }
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    products: HashMap<ProductId, CatalogEntry>,
    availability_checks: usize,
    price_lookups: usize,
    adjustments: Vec<Vec<StockAdjustment>>,
    fail_on_check: bool,
    fail_on_adjust: bool,
    check_latency: Option<Duration>,
    check_barrier: Option<Arc<Barrier>>,
}

/// In-memory inventory service.
///
/// Every adjustment batch runs under one write lock, so the stock guard for
/// a decrement and its write cannot interleave with another batch.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

fn product_not_found(product_id: &ProductId) -> FulfillmentError {
    FulfillmentError::Precondition(FieldError::new(
        "product_id",
        format!("product with id: {product_id} not found"),
    ))
}

impl InMemoryInventory {
    /// Creates an inventory with an empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an inventory seeded with the given products.
    pub fn with_products(products: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let state = InMemoryInventoryState {
            products: products
                .into_iter()
                .map(|entry| (entry.product_id.clone(), entry))
                .collect(),
            ..Default::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Returns the current stock of a product.
    pub async fn stock_of(&self, product_id: &ProductId) -> Option<i64> {
        self.state
            .read()
            .await
            .products
            .get(product_id)
            .map(|entry| entry.stock)
    }

    /// Configures availability checks to fail as if the service were down.
    pub async fn set_fail_on_check(&self, fail: bool) {
        self.state.write().await.fail_on_check = fail;
    }

    /// Configures stock adjustments to fail as if the service were down.
    pub async fn set_fail_on_adjust(&self, fail: bool) {
        self.state.write().await.fail_on_adjust = fail;
    }

    /// Delays every availability check.
    pub async fn set_check_latency(&self, latency: Duration) {
        self.state.write().await.check_latency = Some(latency);
    }

    /// Makes availability checks wait on a barrier before answering.
    pub async fn set_check_barrier(&self, barrier: Arc<Barrier>) {
        self.state.write().await.check_barrier = Some(barrier);
    }

    /// Returns the number of availability checks served.
    pub async fn availability_checks(&self) -> usize {
        self.state.read().await.availability_checks
    }

    /// Returns the number of price lookups served.
    pub async fn price_lookups(&self) -> usize {
        self.state.read().await.price_lookups
    }

    /// Returns every adjustment batch received, oldest first.
    pub async fn adjustments(&self) -> Vec<Vec<StockAdjustment>> {
        self.state.read().await.adjustments.clone()
    }
}

#[async_trait]
impl InventoryClient for InMemoryInventory {
    #[tracing::instrument(skip(self, items), fields(items = items.len()))]
    async fn check_availability(
        &self,
        items: &[LineItem],
    ) -> Result<Vec<Availability>, FulfillmentError> {
        let (latency, barrier) = {
            let mut state = self.state.write().await;
            state.availability_checks += 1;
            if state.fail_on_check {
                return Err(FulfillmentError::remote(
                    SERVICE_INVENTORY,
                    "availability check unavailable",
                ));
            }
            (state.check_latency, state.check_barrier.clone())
        };

        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let state = self.state.read().await;
        items
            .iter()
            .map(|item| {
                let entry = state
                    .products
                    .get(&item.product_id)
                    .ok_or_else(|| product_not_found(&item.product_id))?;
                Ok(Availability {
                    product_id: item.product_id.clone(),
                    available: entry.stock >= i64::from(item.quantity),
                    stock: entry.stock,
                    name: entry.name.clone(),
                })
            })
            .collect()
    }

    #[tracing::instrument(skip(self, product_ids), fields(products = product_ids.len()))]
    async fn get_unit_prices(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Vec<UnitPrice>, FulfillmentError> {
        let mut state = self.state.write().await;
        state.price_lookups += 1;

        let mut prices: Vec<UnitPrice> = Vec::new();
        for product_id in product_ids {
            if prices.iter().any(|p| &p.product_id == product_id) {
                continue;
            }
            let entry = state
                .products
                .get(product_id)
                .ok_or_else(|| product_not_found(product_id))?;
            prices.push(UnitPrice {
                product_id: product_id.clone(),
                price: entry.unit_price,
            });
        }
        Ok(prices)
    }

    #[tracing::instrument(skip(self, adjustments), fields(items = adjustments.len()))]
    async fn adjust_stock(
        &self,
        adjustments: &[StockAdjustment],
    ) -> Result<AdjustmentOutcome, FulfillmentError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        state.adjustments.push(adjustments.to_vec());

        if state.fail_on_adjust {
            return Err(FulfillmentError::remote(
                SERVICE_INVENTORY,
                "stock adjustment unavailable",
            ));
        }
        if let Some(missing) = adjustments
            .iter()
            .find(|adj| !state.products.contains_key(&adj.product_id))
        {
            return Err(product_not_found(&missing.product_id));
        }

        let mut rejected = Vec::new();
        for adjustment in adjustments {
            let Some(entry) = state.products.get_mut(&adjustment.product_id) else {
                continue;
            };
            let quantity = i64::from(adjustment.quantity);
            match adjustment.direction {
                StockDirection::Increment => entry.stock += quantity,
                StockDirection::Decrement if entry.stock < quantity => {
                    tracing::warn!(
                        product_id = %adjustment.product_id,
                        stock = entry.stock,
                        requested = quantity,
                        "insufficient stock for decrement"
                    );
                    metrics::counter!("stock_adjustment_rejected_total").increment(1);
                    rejected.push(adjustment.product_id.clone());
                }
                StockDirection::Decrement => entry.stock -= quantity,
            }
        }

        let outcome = if rejected.is_empty() {
            AdjustmentOutcome {
                success: true,
                message: format!("stock adjusted for {} products", adjustments.len()),
                rejected,
            }
        } else {
            let names: Vec<&str> = rejected.iter().map(ProductId::as_str).collect();
            AdjustmentOutcome {
                success: false,
                message: format!("not enough stock for products: {}", names.join(", ")),
                rejected,
            }
        };
        Ok(outcome)
    }
}
