//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderStatus};
use crate::entity::Entity;

/// A product and quantity within an order, with the unit price captured when
/// the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: Option<String>,
    pub unit_price: Money,
}

impl LineItem {
    pub fn new(
        product_id: ProductId,
        quantity: u32,
        size: Option<String>,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id,
            quantity,
            size,
            unit_price,
        }
    }

    /// Returns the line total (quantity * unit price), `None` on overflow.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_times(self.quantity)
    }
}

/// One entry of an order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
    /// The user who made the change.
    pub by: UserId,
}

/// Order aggregate root.
///
/// The total is computed once when the order is placed and never revisited.
/// The status history is append-only, never empty, and its last entry always
/// carries the current status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    items: Vec<LineItem>,
    total: Money,
    status: OrderStatus,
    history: Vec<StatusChange>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Entity for Order {
    type Id = OrderId;

    const COLLECTION: &'static str = "orders";
    const NAME: &'static str = "Order";

    fn id(&self) -> OrderId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Order {
    /// Places a new order for `user_id`.
    ///
    /// Requires at least one item, a positive quantity on every item, and a
    /// total that fits in [`Money`]. The order starts `Created` with a single history entry made by the buyer.
    pub fn place(
        user_id: UserId,
        items: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        if let Some(item) = items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::InvalidQuantity {
                product_id: item.product_id,
                quantity: item.quantity,
            });
        }

        let total = items
            .iter()
            .map(LineItem::line_total)
            .try_fold(Money::default(), |sum, line| sum.checked_add(line?))
            .ok_or(OrderError::TotalOverflow)?;
        let status = OrderStatus::Created;

        Ok(Self {
            id: OrderId::new(),
            user_id,
            items,
            total,
            status,
            history: vec![StatusChange {
                status,
                at: now,
                by: user_id,
            }],
            created_at: now,
            updated_at: now,
        })
    }

    /// Moves the order to `status` and appends the change to the history.
    ///
    /// Any status is accepted from any status, including the current one.
    pub fn record_status(
        &mut self,
        status: OrderStatus,
        by: UserId,
        at: DateTime<Utc>,
    ) -> &StatusChange {
        self.status = status;
        self.updated_at = at;
        self.history.push(StatusChange { status, at, by });
        &self.history[self.history.len() - 1]
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the user who placed the order.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Returns the total captured at placement.
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the status history, oldest first.
    pub fn history(&self) -> &[StatusChange] {
        &self.history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the total number of units across all items.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}
