//! Review entity and rating types.

use chrono::{DateTime, Utc};
use common::{ProductId, ReviewId, UserId};
use document_store::NumericSummary;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::DomainError;

/// A star rating from 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validates a rating value.
    pub fn new(value: i64) -> Result<Self, DomainError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or_else(|| {
                DomainError::invalid(format!("rating must be between 1 and 5, got {value}"))
            })
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// A product review. At most one per (product, author).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for Review {
    type Id = ReviewId;

    const COLLECTION: &'static str = "reviews";
    const NAME: &'static str = "Review";

    fn id(&self) -> ReviewId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A product's review summary: mean rating and number of reviews.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Mean rating, 0 when there are no reviews.
    pub average: f64,
    pub count: u64,
}

impl From<NumericSummary> for RatingSummary {
    fn from(summary: NumericSummary) -> Self {
        Self {
            average: summary.mean.unwrap_or(0.0),
            count: summary.count,
        }
    }
}

/// A review joined with the names of what it references.
///
/// `product_name` and `user_email` are None when the product or author no
/// longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewListing {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub product_name: Option<String>,
    pub user_id: UserId,
    pub user_email: Option<String>,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}
