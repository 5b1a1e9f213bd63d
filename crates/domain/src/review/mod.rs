//! Product reviews and rating aggregation.

mod model;
mod service;

pub use model::{Rating, RatingSummary, Review, ReviewListing};
pub use service::ReviewService;
