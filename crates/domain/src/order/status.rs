//! Order status markers.
//!
//! Status is a free-form string chosen by the client at creation. Payment
//! recording moves an order through the two markers below:
//! ```text
//! <client status> ──► pending ──► completed
//! ```

/// Status typically supplied by clients when placing an order.
pub const STATUS_PLACED: &str = "placed";

/// Set while payment side effects are being applied.
pub const STATUS_PENDING: &str = "pending";

/// Terminal status once stock has been adjusted for a paid order.
pub const STATUS_COMPLETED: &str = "completed";
