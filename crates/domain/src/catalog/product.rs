//! Product entity and its projections.

use chrono::{DateTime, Utc};
use common::{CategoryId, Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::DomainError;

/// Gender category of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parses a recognized gender name. Anything else yields None.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Male" => Some(Gender::Male),
            "Female" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog product.
///
/// `rating` and `num_reviews` are a cached summary of the product's reviews.
/// They are only rewritten when a review is deleted, so they may lag behind
/// reviews created since.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub gender: Gender,
    pub sizes: Vec<f64>,
    pub stock: u32,
    pub categories: Vec<CategoryId>,
    pub images: Vec<String>,
    pub rating: f64,
    pub num_reviews: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    const COLLECTION: &'static str = "products";
    const NAME: &'static str = "Product";

    fn id(&self) -> ProductId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Product {
    /// Builds a new product from a validated draft.
    pub fn from_draft(draft: ProductDraft) -> Result<Self, DomainError> {
        let now = Utc::now();
        Ok(Self {
            id: ProductId::new(),
            name: validate_name(&draft.name)?,
            description: draft.description.trim().to_string(),
            price: validate_price(draft.price)?,
            gender: validate_gender(&draft.gender)?,
            sizes: draft.sizes,
            stock: draft.stock,
            categories: draft.categories,
            images: draft.images,
            rating: 0.0,
            num_reviews: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies the fields present in a patch.
    ///
    /// Validation runs before any field is touched, so a rejected patch leaves
    /// the product unchanged.
    pub fn apply_patch(&mut self, patch: ProductPatch) -> Result<(), DomainError> {
        let name = patch.name.as_deref().map(validate_name).transpose()?;
        let price = patch.price.map(validate_price).transpose()?;
        let gender = patch.gender.as_deref().map(validate_gender).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description.trim().to_string();
        }
        if let Some(price) = price {
            self.price = price;
        }
        if let Some(gender) = gender {
            self.gender = gender;
        }
        if let Some(sizes) = patch.sizes {
            self.sizes = sizes;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(categories) = patch.categories {
            self.categories = categories;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Overwrites the cached review summary.
    pub fn set_rating_summary(&mut self, rating: f64, num_reviews: u64) {
        self.rating = rating;
        self.num_reviews = num_reviews;
    }

    /// Returns the listing projection of this product.
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            gender: self.gender,
            sizes: self.sizes.clone(),
            stock: self.stock,
            categories: self.categories.clone(),
            images: self.images.clone(),
            rating: self.rating,
            num_reviews: self.num_reviews,
            created_at: self.created_at,
        }
    }
}

fn validate_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::invalid("product name is required"));
    }
    Ok(name.to_string())
}

fn validate_price(price: Money) -> Result<Money, DomainError> {
    if price.is_negative() {
        return Err(DomainError::invalid(format!(
            "price must not be negative: {price}"
        )));
    }
    Ok(price)
}

fn validate_gender(gender: &str) -> Result<Gender, DomainError> {
    Gender::parse(gender).ok_or_else(|| {
        DomainError::invalid(format!(
            "gender must be Male or Female, got {gender:?}"
        ))
    })
}

/// The reduced product shape returned by catalog listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub gender: Gender,
    pub sizes: Vec<f64>,
    pub stock: u32,
    pub categories: Vec<CategoryId>,
    pub images: Vec<String>,
    pub rating: f64,
    pub num_reviews: u64,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new product. Only `name` and `gender` are required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub gender: String,
    pub sizes: Vec<f64>,
    pub stock: u32,
    pub categories: Vec<CategoryId>,
    pub images: Vec<String>,
}

/// A partial product update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub gender: Option<String>,
    pub sizes: Option<Vec<f64>>,
    pub stock: Option<u32>,
    pub categories: Option<Vec<CategoryId>>,
    pub images: Option<Vec<String>>,
}
