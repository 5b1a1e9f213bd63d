//! Product review endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{ProductId, ReviewId};
use document_store::DocumentStore;
use domain::{RatingSummary, Review, ReviewListing};
use serde::Deserialize;

use super::parse_id;
use crate::AppState;
use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

/// GET /products/{id}/reviews: newest first.
#[tracing::instrument(skip(state))]
pub async fn list_for_product<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReviewListing>>, ApiError> {
    let product_id: ProductId = parse_id(&id, "product")?;
    Ok(Json(state.reviews.reviews_for_product(product_id).await?))
}

/// POST /products/{id}/reviews: one review per caller and product.
#[tracing::instrument(skip(state, caller, body))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    body: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let product_id: ProductId = parse_id(&id, "product")?;
    let Json(req) = body?;
    let review = state
        .reviews
        .create_review(&caller, product_id, req.rating, &req.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /admin/reviews: every review with product name and author email.
#[tracing::instrument(skip(state, admin))]
pub async fn admin_list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Vec<ReviewListing>>, ApiError> {
    Ok(Json(state.reviews.list_all_reviews(&admin).await?))
}

/// DELETE /admin/reviews/{id}: returns the product's recomputed summary.
#[tracing::instrument(skip(state, admin))]
pub async fn admin_delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<RatingSummary>, ApiError> {
    let review_id: ReviewId = parse_id(&id, "review")?;
    Ok(Json(state.reviews.delete_review(&admin, review_id).await?))
}
