//! Shared types for the storefront workspace.

mod caller;
mod money;
mod types;

pub use caller::{Caller, Role};
pub use money::Money;
pub use types::{CategoryId, OrderId, ProductId, ReviewId, UserId};
