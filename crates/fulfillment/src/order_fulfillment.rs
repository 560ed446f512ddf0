//! Workflow and step names used in logs and metrics.

/// Workflow identifier for order placement.
pub const WORKFLOW_PLACE_ORDER: &str = "place_order";

/// Workflow identifier for payment recording.
pub const WORKFLOW_RECORD_PAYMENT: &str = "record_payment";

/// Step name: Check stock for every requested product.
pub const STEP_CHECK_AVAILABILITY: &str = "check_availability";

/// Step name: Sum unit prices over every product occurrence.
pub const STEP_PRICE_ORDER: &str = "price_order";

/// Step name: Persist the order and its line items.
pub const STEP_PERSIST_ORDER: &str = "persist_order";

/// Step name: Persist the payment.
pub const STEP_PERSIST_PAYMENT: &str = "persist_payment";

/// Step name: Move the paid order to the pending marker.
pub const STEP_MARK_PENDING: &str = "mark_pending";

/// Step name: Decrement stock for the paid order's line items.
pub const STEP_DECREMENT_STOCK: &str = "decrement_stock";

/// Step name: Move the paid order to the completed marker.
pub const STEP_MARK_COMPLETED: &str = "mark_completed";

/// Service label for inventory calls.
pub const SERVICE_INVENTORY: &str = "inventory";

/// Service label for order service calls.
pub const SERVICE_ORDERS: &str = "orders";
