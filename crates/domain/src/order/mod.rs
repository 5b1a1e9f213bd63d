//! Order aggregate and related types.

mod aggregate;
mod commands;
mod service;
mod status;
mod view;

pub use aggregate::{LineItem, Order, StatusChange};
pub use commands::{OrderLine, PlaceOrder, TransitionStatus};
pub use service::OrderService;
pub use status::OrderStatus;
pub use view::{LineItemView, OrderView};

use common::ProductId;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Invalid quantity.
    #[error("Invalid quantity for {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// Order total does not fit in the money range.
    #[error("Order total exceeds the supported amount")]
    TotalOverflow,

    /// Status name outside the status set.
    #[error("Unknown order status: {0:?}")]
    UnknownStatus(String),
}
