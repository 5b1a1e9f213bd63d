//! Domain layer for the storefront.
//!
//! This crate provides:
//! - The catalog query builder and product administration
//! - The order aggregate with its status workflow and history
//! - The order access policy and administrator role gates
//! - Review handling with rating-summary recomputation
//! - User accounts
//!
//! Entities are persisted through a [`document_store::DocumentStore`]; every
//! operation that depends on who is asking takes an explicit
//! [`common::Caller`].

pub mod access;
pub mod catalog;
pub mod entity;
pub mod error;
pub mod order;
pub mod review;
pub mod users;

pub use access::{authorize_order_read, can_read_order, require_admin};
pub use catalog::{
    CatalogPage, CatalogQuery, CatalogService, CatalogSort, Gender, ImageStore, ImageUpload,
    Product, ProductDraft, ProductPatch, ProductSummary,
};
pub use entity::{Entity, Lookup, Repository};
pub use error::{DomainError, ErrorKind};
pub use order::{
    LineItem, LineItemView, Order, OrderError, OrderLine, OrderService, OrderStatus, OrderView,
    PlaceOrder, StatusChange, TransitionStatus,
};
pub use review::{Rating, RatingSummary, Review, ReviewListing, ReviewService};
pub use users::{User, UserService};
