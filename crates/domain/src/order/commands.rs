//! Order commands.

use common::{OrderId, ProductId};
use serde::{Deserialize, Serialize};

/// A requested line: which product, how many, and optionally which size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
}

impl OrderLine {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
            size: None,
        }
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }
}

/// Command to place a new order for the calling user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub items: Vec<OrderLine>,
}

impl PlaceOrder {
    pub fn new(items: impl IntoIterator<Item = OrderLine>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }
}

/// Command to move an order to a new status.
///
/// The status is kept as received and parsed when the command runs, so an
/// unrecognized name surfaces as an order error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionStatus {
    pub order_id: OrderId,
    pub status: String,
}

impl TransitionStatus {
    pub fn new(order_id: OrderId, status: impl Into<String>) -> Self {
        Self {
            order_id,
            status: status.into(),
        }
    }
}
