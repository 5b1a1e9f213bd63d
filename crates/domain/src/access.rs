//! Role gates and the order access policy.
//!
//! Both checks are stateless and evaluate only the explicit [`Caller`]
//! passed into an operation.

use common::Caller;

use crate::error::DomainError;
use crate::order::Order;

/// Fails with `Forbidden` unless the caller is an administrator.
pub fn require_admin(caller: &Caller, action: &str) -> Result<(), DomainError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!(
            "only administrators may {action}"
        )))
    }
}

/// Returns true if the caller may read the order: administrators read any
/// order, everyone else only their own.
pub fn can_read_order(caller: &Caller, order: &Order) -> bool {
    caller.is_admin() || order.user_id() == caller.user_id
}

/// Applies [`can_read_order`], failing with `Forbidden` on denial.
pub fn authorize_order_read(caller: &Caller, order: &Order) -> Result<(), DomainError> {
    if can_read_order(caller, order) {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!(
            "order {} belongs to another user",
            order.id()
        )))
    }
}
