//! Product catalog: search, administration and image uploads.

mod images;
mod product;
mod query;
mod service;

pub use images::{
    ALLOWED_CONTENT_TYPES, ImageStore, ImageUpload, MAX_IMAGE_BYTES, MAX_IMAGES_PER_UPLOAD,
    slugify, validate_uploads,
};
pub use product::{Gender, Product, ProductDraft, ProductPatch, ProductSummary};
pub use query::{CatalogPage, CatalogQuery, CatalogSort, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use service::CatalogService;
