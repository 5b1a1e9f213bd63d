//! Order service providing the order workflow operations.

use chrono::Utc;
use common::{Caller, OrderId};
use document_store::{DocumentStore, FieldFilter};

use super::view::ProductDetails;
use super::{LineItem, Order, OrderError, OrderStatus, OrderView, PlaceOrder, TransitionStatus};
use crate::access::{authorize_order_read, require_admin};
use crate::catalog::Product;
use crate::entity::{Lookup, Repository};
use crate::error::DomainError;
use crate::users::User;

/// Service for managing orders.
///
/// Every operation takes the caller explicitly; reads go through the order
/// access policy and workflow changes are reserved for administrators.
pub struct OrderService<S: DocumentStore> {
    orders: Repository<S, Order>,
    products: Repository<S, Product>,
    users: Repository<S, User>,
}

impl<S: DocumentStore + Clone> OrderService<S> {
    /// Creates a new order service with the given document store.
    pub fn new(store: S) -> Self {
        Self {
            orders: Repository::new(store.clone()),
            products: Repository::new(store.clone()),
            users: Repository::new(store),
        }
    }
}

impl<S: DocumentStore> OrderService<S> {
    /// Places an order for the caller.
    ///
    /// Every line is validated and its product resolved before anything is
    /// written. Prices are read once, here, and frozen into the order.
    #[tracing::instrument(skip(self, cmd), fields(user_id = %caller.user_id, lines = cmd.items.len()))]
    pub async fn place_order(&self, caller: &Caller, cmd: PlaceOrder) -> Result<Order, DomainError> {
        if cmd.items.is_empty() {
            return Err(OrderError::NoItems.into());
        }
        if let Some(line) = cmd.items.iter().find(|line| line.quantity == 0) {
            return Err(OrderError::InvalidQuantity {
                product_id: line.product_id,
                quantity: line.quantity,
            }
            .into());
        }

        let mut items = Vec::with_capacity(cmd.items.len());
        for line in cmd.items {
            let product = self.products.require(line.product_id).await?;
            items.push(LineItem::new(
                line.product_id,
                line.quantity,
                line.size,
                product.price,
            ));
        }

        let order = Order::place(caller.user_id, items, Utc::now())?;
        self.orders.insert(&order).await?;

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(order_id = %order.id(), total = %order.total(), "order placed");
        Ok(order)
    }

    /// Moves an order to a new status and records the change in its history.
    ///
    /// The status name is checked before the order is loaded.
    #[tracing::instrument(skip(self))]
    pub async fn transition_status(
        &self,
        caller: &Caller,
        cmd: TransitionStatus,
    ) -> Result<Order, DomainError> {
        require_admin(caller, "change order status")?;
        let status: OrderStatus = cmd.status.parse()?;

        let mut order = self.orders.require(cmd.order_id).await?;
        let previous = order.status();
        order.record_status(status, caller.user_id, Utc::now());
        self.orders.save(&order).await?;

        metrics::counter!("order_status_changes_total", "status" => status.as_str())
            .increment(1);
        tracing::info!(order_id = %cmd.order_id, from = %previous, to = %status, "order status changed");
        Ok(order)
    }

    /// Permanently removes an order and its history.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, caller: &Caller, order_id: OrderId) -> Result<(), DomainError> {
        require_admin(caller, "delete orders")?;

        self.orders.delete(order_id).await?;
        metrics::counter!("orders_deleted_total").increment(1);
        tracing::info!(%order_id, "order deleted");
        Ok(())
    }

    /// Loads an order the caller is allowed to read.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, caller: &Caller, order_id: OrderId) -> Result<Order, DomainError> {
        let order = self.orders.require(order_id).await?;
        authorize_order_read(caller, &order)?;
        Ok(order)
    }

    /// Lists the caller's own orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_mine(&self, caller: &Caller) -> Result<Vec<Order>, DomainError> {
        let query = self
            .orders
            .query()
            .filter(FieldFilter::equals("user_id", caller.user_id.to_string()));
        self.orders.find(query).await
    }

    /// Lists every order, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self, caller: &Caller) -> Result<Vec<Order>, DomainError> {
        require_admin(caller, "list all orders")?;
        self.orders.find(self.orders.query()).await
    }

    /// Joins the buyer's email and each line's product name and images onto
    /// orders the caller has already been allowed to read.
    ///
    /// Deleted users and products leave their fields empty.
    #[tracing::instrument(skip_all, fields(orders = orders.len()))]
    pub async fn views(&self, orders: Vec<Order>) -> Result<Vec<OrderView>, DomainError> {
        let mut emails = self.users.lookup(|user| user.email);
        let mut details = self.products.lookup(|product| (product.name, product.images));

        let mut views = Vec::with_capacity(orders.len());
        for order in &orders {
            views.push(Self::resolve(order, &mut emails, &mut details).await?);
        }
        Ok(views)
    }

    /// Single-order form of [`OrderService::views`].
    pub async fn view(&self, order: Order) -> Result<OrderView, DomainError> {
        let mut emails = self.users.lookup(|user| user.email);
        let mut details = self.products.lookup(|product| (product.name, product.images));
        Self::resolve(&order, &mut emails, &mut details).await
    }

    async fn resolve(
        order: &Order,
        emails: &mut Lookup<'_, S, User, String>,
        details: &mut Lookup<'_, S, Product, ProductDetails>,
    ) -> Result<OrderView, DomainError> {
        let user_email = emails.get(order.user_id()).await?;
        let mut products = Vec::with_capacity(order.items().len());
        for item in order.items() {
            products.push(details.get(item.product_id).await?);
        }
        Ok(OrderView::new(order, user_email, products))
    }
}
