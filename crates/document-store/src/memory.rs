use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Document, DocumentId, DocumentQuery, FieldFilter, Result, StoreError,
    store::{DocumentStore, NumericSummary},
};

type Collections = HashMap<String, HashMap<DocumentId, Document>>;

/// In-memory document store implementation.
///
/// Provides the same interface as the PostgreSQL implementation and backs the
/// server when no database is configured.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<Collections>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `Unavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the number of documents in a collection.
    pub async fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, HashMap::len)
    }

    /// Clears all collections.
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store is marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, document: Document) -> Result<()> {
        self.check_available()?;

        let mut collections = self.collections.write().await;
        let collection = collections.entry(document.collection.clone()).or_default();

        if collection.contains_key(&document.id) {
            return Err(StoreError::DuplicateId {
                collection: document.collection,
                id: document.id,
            });
        }

        collection.insert(document.id, document);
        Ok(())
    }

    async fn replace(&self, document: Document) -> Result<bool> {
        self.check_available()?;

        let mut collections = self.collections.write().await;
        match collections
            .get_mut(&document.collection)
            .and_then(|c| c.get_mut(&document.id))
        {
            Some(existing) => {
                *existing = document;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, collection: &str, id: DocumentId) -> Result<Option<Document>> {
        self.check_available()?;

        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|c| c.get(&id)).cloned())
    }

    async fn delete(&self, collection: &str, id: DocumentId) -> Result<Option<Document>> {
        self.check_available()?;

        let mut collections = self.collections.write().await;
        Ok(collections.get_mut(collection).and_then(|c| c.remove(&id)))
    }

    async fn find(&self, query: DocumentQuery) -> Result<Vec<Document>> {
        self.check_available()?;

        let collections = self.collections.read().await;
        let Some(collection) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut documents: Vec<_> = collection
            .values()
            .filter(|d| query.matches(d))
            .cloned()
            .collect();

        documents.sort_by(|a, b| query.sort.compare(a, b));

        // Apply offset and limit
        let offset = query.offset.unwrap_or(0);
        let documents = documents.into_iter().skip(offset);
        let documents = match query.limit {
            Some(limit) => documents.take(limit).collect(),
            None => documents.collect(),
        };

        Ok(documents)
    }

    async fn count(&self, collection: &str, filters: &[FieldFilter]) -> Result<u64> {
        self.check_available()?;

        let collections = self.collections.read().await;
        let count = collections.get(collection).map_or(0, |c| {
            c.values()
                .filter(|d| filters.iter().all(|f| f.matches(&d.body)))
                .count()
        });
        Ok(count as u64)
    }

    async fn summarize(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        field: &str,
    ) -> Result<NumericSummary> {
        self.check_available()?;

        let collections = self.collections.read().await;
        let Some(collection) = collections.get(collection) else {
            return Ok(NumericSummary::default());
        };

        let (count, sum, numeric) = collection
            .values()
            .filter(|d| filters.iter().all(|f| f.matches(&d.body)))
            .fold((0u64, 0f64, 0u64), |(count, sum, numeric), d| {
                match d.body.get(field).and_then(serde_json::Value::as_f64) {
                    Some(value) => (count + 1, sum + value, numeric + 1),
                    None => (count + 1, sum, numeric),
                }
            });

        Ok(NumericSummary {
            count,
            mean: (numeric > 0).then(|| sum / numeric as f64),
        })
    }
}
