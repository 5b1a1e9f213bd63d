//! Catalog browsing and product administration endpoints.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use common::{CategoryId, Money, ProductId};
use document_store::DocumentStore;
use domain::{
    CatalogPage, CatalogQuery, CatalogSort, ImageUpload, Product, ProductDraft, ProductPatch,
    ProductSummary,
};
use serde::{Deserialize, Serialize};

use super::parse_id;
use crate::AppState;
use crate::auth::AdminUser;
use crate::error::ApiError;

/// Multipart field carrying product images.
pub const IMAGES_FIELD: &str = "images";

/// Raw `/products` query string.
///
/// Values stay strings so malformed numbers and ids become 400s with a
/// message rather than a bare extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub q: Option<String>,
    pub gender: Option<String>,
    /// Comma-separated category ids.
    pub categories: Option<String>,
    /// Inclusive bounds, in cents.
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

fn parse_number<T: FromStr>(raw: Option<&str>, name: &str) -> Result<Option<T>, ApiError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("{name} must be an integer, got {value:?}"))),
    }
}

impl ProductListParams {
    /// Converts the raw parameters into a catalog query.
    pub fn to_query(&self) -> Result<CatalogQuery, ApiError> {
        let mut query = CatalogQuery::new();

        if let Some(text) = &self.q {
            query = query.text(text.as_str());
        }
        if let Some(gender) = &self.gender {
            query = query.gender(gender.as_str());
        }
        if let Some(raw) = &self.categories {
            let ids = raw
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| parse_id::<CategoryId>(id, "category"))
                .collect::<Result<Vec<_>, _>>()?;
            query = query.categories(ids);
        }
        if let Some(cents) = parse_number::<i64>(self.min_price.as_deref(), "min_price")? {
            query = query.min_price(Money::from_cents(cents));
        }
        if let Some(cents) = parse_number::<i64>(self.max_price.as_deref(), "max_price")? {
            query = query.max_price(Money::from_cents(cents));
        }
        if let Some(sort) = &self.sort {
            query = query.sort(CatalogSort::from_param(sort));
        }
        if let Some(page) = parse_number(self.page.as_deref(), "page")? {
            query = query.page(page);
        }
        if let Some(page_size) = parse_number(self.page_size.as_deref(), "page_size")? {
            query = query.page_size(page_size);
        }

        Ok(query)
    }
}

#[derive(Serialize)]
pub struct UploadedImagesResponse {
    pub uris: Vec<String>,
}

/// GET /products: search the catalog.
#[tracing::instrument(skip(state))]
pub async fn search<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<CatalogPage<ProductSummary>>, ApiError> {
    let query = params.to_query()?;
    Ok(Json(state.catalog.search(&query).await?))
}

/// GET /products/{id}: full product detail.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id: ProductId = parse_id(&id, "product")?;
    Ok(Json(state.catalog.get_product(id).await?))
}

/// GET /admin/products: every product, newest first.
#[tracing::instrument(skip(state, admin))]
pub async fn admin_list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalog.list_all_products(&admin).await?))
}

/// POST /admin/products: create a product.
#[tracing::instrument(skip(state, admin, body))]
pub async fn admin_create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(admin): AdminUser,
    body: Result<Json<ProductDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(draft) = body?;
    let product = state.catalog.create_product(&admin, draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /admin/products/{id}: patch a product.
#[tracing::instrument(skip(state, admin, body))]
pub async fn admin_update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    body: Result<Json<ProductPatch>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let id: ProductId = parse_id(&id, "product")?;
    let Json(patch) = body?;
    Ok(Json(state.catalog.update_product(&admin, id, patch).await?))
}

/// DELETE /admin/products/{id}
#[tracing::instrument(skip(state, admin))]
pub async fn admin_delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: ProductId = parse_id(&id, "product")?;
    state.catalog.delete_product(&admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/products/images: multipart upload, one or more `images` parts.
///
/// Other fields are ignored. Returns the stored URIs in upload order.
#[tracing::instrument(skip(state, admin, multipart))]
pub async fn admin_upload_images<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(admin): AdminUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedImagesResponse>), ApiError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGES_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await?;
        uploads.push(ImageUpload::new(file_name, content_type, bytes.to_vec()));
    }

    let uris = state
        .catalog
        .upload_images(&admin, state.images.as_ref(), uploads)
        .await?;
    Ok((StatusCode::CREATED, Json(UploadedImagesResponse { uris })))
}
