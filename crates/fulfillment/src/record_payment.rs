//! Idempotent payment recording.

use std::time::Instant;

use common::RecordId;
use domain::{
    NewPayment, Payment, PaymentRepository, RecordPaymentRequest, STATUS_COMPLETED,
    STATUS_PENDING, group_line_items,
};
use idempotency::{Fingerprint, IdempotencyStore, IdempotencyStoreExt, SingleFlight};

use crate::config::WorkflowConfig;
use crate::error::{FulfillmentError, Result};
use crate::order_fulfillment;
use crate::services::{InventoryClient, OrderClient, StockAdjustment};

/// Records payments and drives the paid order through its status markers.
///
/// The payment row is written first and is never rolled back: a failure in
/// a later step is returned to the caller, but a retry finds the payment in
/// the idempotency store and succeeds.
pub struct PaymentWorkflow<P, O, I, S>
where
    P: PaymentRepository,
    O: OrderClient,
    I: InventoryClient,
    S: IdempotencyStore,
{
    payments: P,
    orders: O,
    inventory: I,
    store: S,
    config: WorkflowConfig,
    flights: SingleFlight<Result<RecordId>>,
}

impl<P, O, I, S> PaymentWorkflow<P, O, I, S>
where
    P: PaymentRepository,
    O: OrderClient,
    I: InventoryClient,
    S: IdempotencyStore,
{
    pub fn new(payments: P, orders: O, inventory: I, store: S) -> Self {
        Self::with_config(payments, orders, inventory, store, WorkflowConfig::default())
    }

    pub fn with_config(
        payments: P,
        orders: O,
        inventory: I,
        store: S,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            payments,
            orders,
            inventory,
            store,
            config,
            flights: SingleFlight::new(),
        }
    }

    pub fn payments(&self) -> &P {
        &self.payments
    }

    pub fn orders(&self) -> &O {
        &self.orders
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Records a payment for an order and returns the payment ID.
    ///
    /// At most one payment succeeds per order: any later request for the
    /// same order returns the first payment's ID.
    #[tracing::instrument(skip(self, request), fields(workflow = order_fulfillment::WORKFLOW_RECORD_PAYMENT))]
    pub async fn record_payment(&self, request: &RecordPaymentRequest) -> Result<RecordId> {
        let started = Instant::now();
        let new_payment = request.validate().map_err(FulfillmentError::Validation)?;
        let fingerprint = Fingerprint::for_payment(new_payment.order_id);

        let result = match self.cached(&fingerprint).await {
            Some(payment_id) => Ok(payment_id),
            None if self.config.single_flight => {
                self.flights
                    .run(&fingerprint, || self.execute(&fingerprint, &new_payment))
                    .await
            }
            None => self.execute(&fingerprint, &new_payment).await,
        };

        metrics::histogram!(
            "workflow_duration_seconds",
            "workflow" => order_fulfillment::WORKFLOW_RECORD_PAYMENT
        )
        .record(started.elapsed().as_secs_f64());
        result
    }

    /// Loads a payment by ID.
    pub async fn get_payment(&self, payment_id: RecordId) -> Result<Payment> {
        Ok(self.payments.get_payment(payment_id).await?)
    }

    async fn cached(&self, fingerprint: &Fingerprint) -> Option<RecordId> {
        let payment: Payment = self.store.get(fingerprint).await?;
        metrics::counter!(
            "idempotency_hits_total",
            "workflow" => order_fulfillment::WORKFLOW_RECORD_PAYMENT
        )
        .increment(1);
        tracing::info!(%fingerprint, payment_id = %payment.id, "returning previously recorded payment");
        Some(payment.id)
    }

    async fn execute(&self, fingerprint: &Fingerprint, new_payment: &NewPayment) -> Result<RecordId> {
        if let Some(payment_id) = self.cached(fingerprint).await {
            return Ok(payment_id);
        }

        tracing::info!(step = order_fulfillment::STEP_PERSIST_PAYMENT, "workflow step started");
        let payment = Payment {
            id: RecordId::new(),
            user_id: new_payment.user_id.clone(),
            order_id: new_payment.order_id,
            amount: new_payment.amount,
            payment_date: new_payment.payment_date,
            status: new_payment.status.clone(),
        };
        let payment_id = self.payments.create_payment(payment.clone()).await?;

        if let Err(error) = self.store.set(fingerprint, &payment).await {
            tracing::warn!(%fingerprint, %error, "failed to remember recorded payment");
        }
        metrics::counter!("payments_recorded_total").increment(1);

        if let Err(error) = self.fulfill(new_payment.order_id).await {
            tracing::error!(
                %payment_id,
                order_id = %new_payment.order_id,
                %error,
                "payment committed but order fulfillment failed"
            );
            return Err(error);
        }

        tracing::info!(%payment_id, order_id = %new_payment.order_id, "payment recorded");
        Ok(payment_id)
    }

    /// Moves the order to pending, takes its stock, then marks it completed.
    async fn fulfill(&self, order_id: RecordId) -> Result<()> {
        tracing::info!(step = order_fulfillment::STEP_MARK_PENDING, "workflow step started");
        self.set_order_status(order_id, STATUS_PENDING).await?;

        tracing::info!(step = order_fulfillment::STEP_DECREMENT_STOCK, "workflow step started");
        let product_ids = self.orders.get_order_product_ids(order_id).await?;
        let decrements: Vec<StockAdjustment> = group_line_items(&product_ids)
            .into_iter()
            .map(|item| StockAdjustment::decrement(item.product_id, item.quantity))
            .collect();

        if !decrements.is_empty() {
            let outcome = self.inventory.adjust_stock(&decrements).await?;
            if !outcome.success {
                // No compensation: the payment stands and the order proceeds.
                tracing::warn!(
                    %order_id,
                    rejected = ?outcome.rejected,
                    message = %outcome.message,
                    "stock decrement rejected for paid order"
                );
            }
        }

        tracing::info!(step = order_fulfillment::STEP_MARK_COMPLETED, "workflow step started");
        self.set_order_status(order_id, STATUS_COMPLETED).await
    }

    async fn set_order_status(&self, order_id: RecordId, status: &str) -> Result<()> {
        if self.orders.update_order_status(order_id, status).await? {
            Ok(())
        } else {
            Err(FulfillmentError::remote(
                order_fulfillment::SERVICE_ORDERS,
                format!("order {order_id} status was not updated to {status}"),
            ))
        }
    }
}
