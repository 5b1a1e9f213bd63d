//! HTTP handlers, grouped by resource.

pub mod catalog;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod reviews;
pub mod users;

use std::str::FromStr;

use crate::error::ApiError;

/// Parses a path id, rejecting malformed values with 400.
fn parse_id<T>(raw: &str, what: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = uuid::Error>,
{
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid {what} id: {e}")))
}
