use async_trait::async_trait;

use crate::{Document, DocumentId, DocumentQuery, FieldFilter, Result};

/// Count and mean of a numeric field over the documents matching a filter set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumericSummary {
    /// Number of matching documents.
    pub count: u64,

    /// Mean of the field over the matching documents, None when nothing matched.
    pub mean: Option<f64>,
}

/// Core trait for document store implementations.
///
/// Documents are grouped into collections and addressed by id. Writes replace
/// whole documents; there is no versioning, so concurrent writers to the same
/// document resolve as last-write-wins. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document.
    ///
    /// Fails with `DuplicateId` if the collection already holds the id.
    async fn insert(&self, document: Document) -> Result<()>;

    /// Overwrites an existing document.
    ///
    /// Returns false if no document with that id exists.
    async fn replace(&self, document: Document) -> Result<bool>;

    /// Point lookup by id.
    async fn get(&self, collection: &str, id: DocumentId) -> Result<Option<Document>>;

    /// Removes a document, returning it if it existed.
    async fn delete(&self, collection: &str, id: DocumentId) -> Result<Option<Document>>;

    /// Retrieves the documents matching a query, ordered and windowed.
    async fn find(&self, query: DocumentQuery) -> Result<Vec<Document>>;

    /// Counts the documents matching all filters.
    async fn count(&self, collection: &str, filters: &[FieldFilter]) -> Result<u64>;

    /// Groups the matching documents and summarizes a numeric field.
    async fn summarize(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        field: &str,
    ) -> Result<NumericSummary>;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Checks if a document exists.
    async fn exists(&self, collection: &str, id: DocumentId) -> Result<bool> {
        Ok(self.get(collection, id).await?.is_some())
    }

    /// Returns the first document matching a query.
    async fn find_one(&self, query: DocumentQuery) -> Result<Option<Document>> {
        Ok(self.find(query.limit(1)).await?.into_iter().next())
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}
