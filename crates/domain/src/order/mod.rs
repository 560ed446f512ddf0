//! Order record, line items and placement requests.

mod record;
mod request;
mod status;

pub use record::{LineItem, Order, group_line_items};
pub use request::{NewOrder, PlaceOrderRequest};
pub use status::{STATUS_COMPLETED, STATUS_PENDING, STATUS_PLACED};
