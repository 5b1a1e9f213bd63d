//! Review service: review creation, listings and rating aggregation.

use chrono::Utc;
use common::{Caller, ProductId, ReviewId};
use document_store::{DocumentStore, FieldFilter};

use super::model::{Rating, RatingSummary, Review, ReviewListing};
use crate::access::require_admin;
use crate::catalog::Product;
use crate::entity::Repository;
use crate::error::DomainError;
use crate::users::User;

fn for_product(product_id: ProductId) -> FieldFilter {
    FieldFilter::equals("product_id", product_id.to_string())
}

/// Service for product reviews.
///
/// Keeps each product's cached rating summary in step with its reviews, but
/// only on deletion. Creating a review leaves the summary as it was until
/// the next deletion for that product recomputes it.
pub struct ReviewService<S: DocumentStore> {
    reviews: Repository<S, Review>,
    products: Repository<S, Product>,
    users: Repository<S, User>,
}

impl<S: DocumentStore + Clone> ReviewService<S> {
    pub fn new(store: S) -> Self {
        Self {
            reviews: Repository::new(store.clone()),
            products: Repository::new(store.clone()),
            users: Repository::new(store),
        }
    }
}

impl<S: DocumentStore> ReviewService<S> {
    /// Posts the caller's review of a product.
    ///
    /// Fails with `Conflict` if the caller already reviewed the product.
    #[tracing::instrument(skip(self, comment))]
    pub async fn create_review(
        &self,
        caller: &Caller,
        product_id: ProductId,
        rating: i64,
        comment: &str,
    ) -> Result<Review, DomainError> {
        let rating = Rating::new(rating)?;
        self.products.require(product_id).await?;

        let existing = self
            .reviews
            .count(&[
                for_product(product_id),
                FieldFilter::equals("user_id", caller.user_id.to_string()),
            ])
            .await?;
        if existing > 0 {
            return Err(DomainError::Conflict(format!(
                "user {} already reviewed product {product_id}",
                caller.user_id
            )));
        }

        let review = Review {
            id: ReviewId::new(),
            product_id,
            user_id: caller.user_id,
            rating,
            comment: comment.trim().to_string(),
            created_at: Utc::now(),
        };
        self.reviews.insert(&review).await?;

        metrics::counter!("reviews_created_total").increment(1);
        Ok(review)
    }

    /// Lists a product's reviews, newest first, with author emails resolved
    /// where the author still exists.
    #[tracing::instrument(skip(self))]
    pub async fn reviews_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ReviewListing>, DomainError> {
        let query = self.reviews.query().filter(for_product(product_id));
        self.listings(self.reviews.find(query).await?).await
    }

    /// Lists every review, newest first, with product names and author
    /// emails resolved where they still exist.
    #[tracing::instrument(skip(self))]
    pub async fn list_all_reviews(&self, caller: &Caller) -> Result<Vec<ReviewListing>, DomainError> {
        require_admin(caller, "list all reviews")?;
        self.listings(self.reviews.find(self.reviews.query()).await?).await
    }

    async fn listings(&self, reviews: Vec<Review>) -> Result<Vec<ReviewListing>, DomainError> {
        let mut product_names = self.products.lookup(|product| product.name);
        let mut user_emails = self.users.lookup(|user| user.email);

        let mut listings = Vec::with_capacity(reviews.len());
        for review in reviews {
            listings.push(ReviewListing {
                product_name: product_names.get(review.product_id).await?,
                user_email: user_emails.get(review.user_id).await?,
                id: review.id,
                product_id: review.product_id,
                user_id: review.user_id,
                rating: review.rating,
                comment: review.comment,
                created_at: review.created_at,
            });
        }
        Ok(listings)
    }

    /// Deletes a review and recomputes its product's rating summary.
    #[tracing::instrument(skip(self))]
    pub async fn delete_review(
        &self,
        caller: &Caller,
        review_id: ReviewId,
    ) -> Result<RatingSummary, DomainError> {
        require_admin(caller, "delete reviews")?;

        let review = self.reviews.delete(review_id).await?;
        metrics::counter!("reviews_deleted_total").increment(1);

        self.recompute_rating(review.product_id).await
    }

    /// Recomputes a product's rating summary from its remaining reviews and
    /// writes it onto the product.
    ///
    /// The write is skipped if the product no longer exists, including when
    /// it is deleted while the summary is being computed.
    #[tracing::instrument(skip(self))]
    pub async fn recompute_rating(&self, product_id: ProductId) -> Result<RatingSummary, DomainError> {
        let summary: RatingSummary = self
            .reviews
            .summarize(&[for_product(product_id)], "rating")
            .await?
            .into();

        let Some(mut product) = self.products.get(product_id).await? else {
            tracing::warn!(%product_id, "review references a missing product, summary not written");
            return Ok(summary);
        };

        product.set_rating_summary(summary.average, summary.count);
        match self.products.save(&product).await {
            Ok(()) => {}
            Err(DomainError::NotFound { .. }) => {
                tracing::warn!(%product_id, "product deleted during rating recompute, summary not written");
                return Ok(summary);
            }
            Err(e) => return Err(e),
        }

        metrics::counter!("product_ratings_recomputed_total").increment(1);
        tracing::debug!(%product_id, average = summary.average, count = summary.count, "rating recomputed");
        Ok(summary)
    }
}
