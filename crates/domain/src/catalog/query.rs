//! Catalog filter, sort and pagination parameters.

use common::{CategoryId, Money};
use document_store::{DocumentQuery, FieldFilter, SortDirection, SortOrder};
use serde::Serialize;

use super::product::{Gender, Product};
use crate::entity::Entity;

/// Page size used when none is requested.
pub const DEFAULT_PAGE_SIZE: i64 = 12;

/// Largest page size a caller can get.
pub const MAX_PAGE_SIZE: i64 = 50;

/// Catalog ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSort {
    /// Most recently created first.
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl CatalogSort {
    /// Reads a sort name. Unknown or blank names fall back to `Newest`.
    pub fn from_param(value: &str) -> Self {
        match value.trim() {
            "price_asc" => CatalogSort::PriceAsc,
            "price_desc" => CatalogSort::PriceDesc,
            _ => CatalogSort::Newest,
        }
    }

    fn sort_order(self) -> SortOrder {
        match self {
            CatalogSort::Newest => SortOrder::newest_first(),
            CatalogSort::PriceAsc => SortOrder::by_number("price", SortDirection::Ascending),
            CatalogSort::PriceDesc => SortOrder::by_number("price", SortDirection::Descending),
        }
    }
}

/// A catalog search request.
///
/// Holds the values as requested; normalization (blank text, unknown gender,
/// out-of-range paging) happens when the query is compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub text: Option<String>,
    pub gender: Option<String>,
    pub category_ids: Vec<CategoryId>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub sort: CatalogSort,
    pub page: i64,
    pub page_size: i64,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            text: None,
            gender: None,
            category_ids: Vec::new(),
            min_price: None,
            max_price: None,
            sort: CatalogSort::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn categories(mut self, ids: impl IntoIterator<Item = CategoryId>) -> Self {
        self.category_ids = ids.into_iter().collect();
        self
    }

    pub fn min_price(mut self, price: Money) -> Self {
        self.min_price = Some(price);
        self
    }

    pub fn max_price(mut self, price: Money) -> Self {
        self.max_price = Some(price);
        self
    }

    pub fn sort(mut self, sort: CatalogSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    /// The page actually served: at least 1.
    pub fn effective_page(&self) -> u64 {
        self.page.max(1).unsigned_abs()
    }

    /// The page size actually used: clamped into `[1, MAX_PAGE_SIZE]`.
    pub fn effective_page_size(&self) -> u64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE).unsigned_abs()
    }

    /// Compiles the request into store filters. All filters must match.
    pub fn filters(&self) -> Vec<FieldFilter> {
        let mut filters = Vec::new();

        if let Some(text) = self.text.as_deref().map(str::trim)
            && !text.is_empty()
        {
            filters.push(FieldFilter::text(["name", "description"], text));
        }

        if let Some(gender) = self.gender.as_deref().and_then(Gender::parse) {
            filters.push(FieldFilter::equals("gender", gender.as_str()));
        }

        if !self.category_ids.is_empty() {
            filters.push(FieldFilter::contains_any(
                "categories",
                self.category_ids.iter().map(ToString::to_string),
            ));
        }

        if self.min_price.is_some() || self.max_price.is_some() {
            filters.push(FieldFilter::range(
                "price",
                self.min_price.map(|m| m.cents()),
                self.max_price.map(|m| m.cents()),
            ));
        }

        filters
    }

    /// Compiles the request into a windowed, ordered document query.
    pub fn document_query(&self) -> DocumentQuery {
        let page_size = self.effective_page_size();
        let offset = (self.effective_page() - 1).saturating_mul(page_size);

        DocumentQuery::new(Product::COLLECTION)
            .filters(self.filters())
            .sort(self.sort.sort_order())
            .offset(usize::try_from(offset).unwrap_or(usize::MAX))
            .limit(page_size as usize)
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogPage<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_count: u64,
    pub total_pages: u64,
}

impl<T> CatalogPage<T> {
    pub fn new(items: Vec<T>, page: u64, page_size: u64, total_count: u64) -> Self {
        Self {
            items,
            page,
            page_size,
            total_count,
            total_pages: total_count.div_ceil(page_size.max(1)),
        }
    }
}
