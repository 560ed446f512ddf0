use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{Money, RecordId, UserId};
use tokio::sync::RwLock;

use crate::order::{LineItem, Order};
use crate::payment::Payment;
use crate::repository::{OrderRepository, PaymentRepository};
use crate::{PersistenceError, Result};

/// Order row plus its grouped line items, mirroring the two-table layout
/// of the order store.
#[derive(Debug, Clone)]
struct StoredOrder {
    user_id: UserId,
    total_price: Money,
    ordered_date: NaiveDate,
    status: String,
    line_items: Vec<LineItem>,
}

impl StoredOrder {
    fn to_order(&self, id: RecordId) -> Order {
        let product_ids = self
            .line_items
            .iter()
            .flat_map(|item| std::iter::repeat_n(item.product_id.clone(), item.quantity as usize))
            .collect();

        Order {
            id,
            user_id: self.user_id.clone(),
            product_ids,
            total_price: self.total_price,
            ordered_date: self.ordered_date,
            status: self.status.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct OrderTable {
    orders: HashMap<RecordId, StoredOrder>,
    status_history: HashMap<RecordId, Vec<String>>,
    create_calls: usize,
    fail_writes: bool,
}

/// In-memory order store.
///
/// Records every status an order has held so tests can assert on the
/// sequence of transitions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<OrderTable>>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with a backend error.
    pub async fn set_fail_writes(&self, fail: bool) {
        self.state.write().await.fail_writes = fail;
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns how many times `create_order` has been called.
    pub async fn create_calls(&self) -> usize {
        self.state.read().await.create_calls
    }

    /// Returns every status the order has held, oldest first.
    pub async fn status_history(&self, id: RecordId) -> Vec<String> {
        self.state
            .read()
            .await
            .status_history
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    async fn create_order(&self, order: Order) -> Result<RecordId> {
        let mut state = self.state.write().await;
        state.create_calls += 1;

        if state.fail_writes {
            return Err(PersistenceError::Backend("order store unavailable".to_string()));
        }
        if state.orders.contains_key(&order.id) {
            return Err(PersistenceError::AlreadyExists {
                entity: "order",
                id: order.id,
            });
        }

        let line_items = order.line_items();
        state
            .status_history
            .insert(order.id, vec![order.status.clone()]);
        state.orders.insert(
            order.id,
            StoredOrder {
                user_id: order.user_id,
                total_price: order.total_price,
                ordered_date: order.ordered_date,
                status: order.status,
                line_items,
            },
        );

        Ok(order.id)
    }

    async fn get_order(&self, id: RecordId) -> Result<Order> {
        self.state
            .read()
            .await
            .orders
            .get(&id)
            .map(|stored| stored.to_order(id))
            .ok_or(PersistenceError::NotFound { entity: "order", id })
    }

    #[tracing::instrument(skip(self))]
    async fn update_order_status(&self, id: RecordId, status: &str) -> Result<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if state.fail_writes {
            return Err(PersistenceError::Backend("order store unavailable".to_string()));
        }

        let stored = state
            .orders
            .get_mut(&id)
            .ok_or(PersistenceError::NotFound { entity: "order", id })?;
        stored.status = status.to_string();
        state
            .status_history
            .entry(id)
            .or_default()
            .push(status.to_string());

        Ok(())
    }
}

#[derive(Debug, Default)]
struct PaymentTable {
    payments: HashMap<RecordId, Payment>,
    create_calls: usize,
    fail_writes: bool,
}

/// In-memory payment store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentRepository {
    state: Arc<RwLock<PaymentTable>>,
}

impl InMemoryPaymentRepository {
    /// Creates a new empty payment store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with a backend error.
    pub async fn set_fail_writes(&self, fail: bool) {
        self.state.write().await.fail_writes = fail;
    }

    /// Returns the number of stored payments.
    pub async fn payment_count(&self) -> usize {
        self.state.read().await.payments.len()
    }

    /// Returns how many times `create_payment` has been called.
    pub async fn create_calls(&self) -> usize {
        self.state.read().await.create_calls
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    #[tracing::instrument(skip(self, payment), fields(payment_id = %payment.id))]
    async fn create_payment(&self, payment: Payment) -> Result<RecordId> {
        let mut state = self.state.write().await;
        state.create_calls += 1;

        if state.fail_writes {
            return Err(PersistenceError::Backend("payment store unavailable".to_string()));
        }
        if state.payments.contains_key(&payment.id) {
            return Err(PersistenceError::AlreadyExists {
                entity: "payment",
                id: payment.id,
            });
        }

        let id = payment.id;
        state.payments.insert(id, payment);
        Ok(id)
    }

    async fn get_payment(&self, id: RecordId) -> Result<Payment> {
        self.state
            .read()
            .await
            .payments
            .get(&id)
            .cloned()
            .ok_or(PersistenceError::NotFound {
                entity: "payment",
                id,
            })
    }
}
