//! Order read model with its references resolved.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::Serialize;

use super::{LineItem, Order, OrderStatus, StatusChange};

/// A line item with the current name and images of its product.
///
/// `unit_price` stays the price captured at placement. The product fields are
/// None or empty when the product has since been deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItemView {
    pub product_id: ProductId,
    pub product_name: Option<String>,
    pub product_images: Vec<String>,
    pub quantity: u32,
    pub size: Option<String>,
    pub unit_price: Money,
}

/// An order as returned to readers, with the buyer's email and product
/// details joined in where the references still resolve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_email: Option<String>,
    pub items: Vec<LineItemView>,
    pub total: Money,
    pub status: OrderStatus,
    pub history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Name and images of a product still in the catalog.
pub(crate) type ProductDetails = (String, Vec<String>);

impl OrderView {
    pub(crate) fn new(
        order: &Order,
        user_email: Option<String>,
        products: Vec<Option<ProductDetails>>,
    ) -> Self {
        let items = order
            .items()
            .iter()
            .zip(products)
            .map(|(item, product)| LineItemView::new(item, product))
            .collect();

        Self {
            id: order.id(),
            user_id: order.user_id(),
            user_email,
            items,
            total: order.total(),
            status: order.status(),
            history: order.history().to_vec(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

impl LineItemView {
    fn new(item: &LineItem, product: Option<ProductDetails>) -> Self {
        let (product_name, product_images) = match product {
            Some((name, images)) => (Some(name), images),
            None => (None, Vec::new()),
        };
        Self {
            product_id: item.product_id,
            product_name,
            product_images,
            quantity: item.quantity,
            size: item.size.clone(),
            unit_price: item.unit_price,
        }
    }
}
