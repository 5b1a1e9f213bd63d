//! Catalog service: public search and product administration.

use std::time::Instant;

use chrono::Utc;
use common::{Caller, ProductId};
use document_store::DocumentStore;

use super::images::{ImageStore, ImageUpload, validate_uploads};
use super::product::{Product, ProductDraft, ProductPatch, ProductSummary};
use super::query::{CatalogPage, CatalogQuery};
use crate::access::require_admin;
use crate::entity::Repository;
use crate::error::DomainError;

/// Service for browsing and managing the product catalog.
pub struct CatalogService<S: DocumentStore> {
    products: Repository<S, Product>,
}

impl<S: DocumentStore> CatalogService<S> {
    /// Creates a new catalog service with the given document store.
    pub fn new(store: S) -> Self {
        Self {
            products: Repository::new(store),
        }
    }

    /// Runs a catalog search and returns one page of summaries.
    ///
    /// Read-only. Pages past the end come back empty with an accurate
    /// `total_count`.
    #[tracing::instrument(skip(self))]
    pub async fn search(
        &self,
        query: &CatalogQuery,
    ) -> Result<CatalogPage<ProductSummary>, DomainError> {
        metrics::counter!("catalog_queries_total").increment(1);
        let start = Instant::now();

        let filters = query.filters();
        let (products, total_count) = tokio::try_join!(
            self.products.find(query.document_query()),
            self.products.count(&filters),
        )?;

        metrics::histogram!("catalog_query_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        let items = products.iter().map(Product::summary).collect();
        Ok(CatalogPage::new(
            items,
            query.effective_page(),
            query.effective_page_size(),
            total_count,
        ))
    }

    /// Loads a product with full detail.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, DomainError> {
        self.products.require(id).await
    }

    /// Lists every product, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_all_products(&self, caller: &Caller) -> Result<Vec<Product>, DomainError> {
        require_admin(caller, "list all products")?;
        self.products.find(self.products.query()).await
    }

    #[tracing::instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_product(
        &self,
        caller: &Caller,
        draft: ProductDraft,
    ) -> Result<Product, DomainError> {
        require_admin(caller, "create products")?;

        let product = Product::from_draft(draft)?;
        self.products.insert(&product).await?;

        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update_product(
        &self,
        caller: &Caller,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, DomainError> {
        require_admin(caller, "update products")?;

        let mut product = self.products.require(id).await?;
        product.apply_patch(patch)?;
        self.products.save(&product).await?;

        Ok(product)
    }

    /// Deletes a product. Orders, reviews and categories that reference it
    /// are left as they are.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, caller: &Caller, id: ProductId) -> Result<(), DomainError> {
        require_admin(caller, "delete products")?;

        self.products.delete(id).await?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// Validates and stores a batch of product images, returning their URIs
    /// in upload order.
    ///
    /// If storing any image fails, the images already stored for the batch
    /// are removed on a best-effort basis and the failure is returned.
    #[tracing::instrument(skip(self, images, uploads), fields(count = uploads.len()))]
    pub async fn upload_images<I: ImageStore + ?Sized>(
        &self,
        caller: &Caller,
        images: &I,
        uploads: Vec<ImageUpload>,
    ) -> Result<Vec<String>, DomainError> {
        require_admin(caller, "upload product images")?;
        validate_uploads(&uploads)?;

        let now = Utc::now();
        let mut stored = Vec::with_capacity(uploads.len());
        let mut uris = Vec::with_capacity(uploads.len());
        for (position, upload) in uploads.iter().enumerate() {
            let name = upload.stored_name(now, position)?;
            match images.put(&name, &upload.bytes).await {
                Ok(uri) => {
                    stored.push(name);
                    uris.push(uri);
                }
                Err(e) => {
                    discard_images(images, &stored).await;
                    return Err(e);
                }
            }
        }
        Ok(uris)
    }
}

async fn discard_images<I: ImageStore + ?Sized>(images: &I, names: &[String]) {
    for name in names {
        if let Err(e) = images.remove(name).await {
            tracing::warn!(file_name = %name, error = %e, "failed to remove image from an aborted upload");
        }
    }
}
