//! Mapping between domain entities and stored documents.

use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use document_store::{
    Document, DocumentId, DocumentQuery, DocumentStore, FieldFilter, NumericSummary,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::DomainError;

/// An entity persisted as one document in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Identifier type of the entity.
    type Id: Copy + Eq + Hash + Into<Uuid> + std::fmt::Display + Send + Sync;

    /// Collection the entity is stored in.
    const COLLECTION: &'static str;

    /// Human-readable entity name used in error messages.
    const NAME: &'static str;

    fn id(&self) -> Self::Id;

    fn created_at(&self) -> DateTime<Utc>;
}

fn document_id<T: Entity>(id: T::Id) -> DocumentId {
    DocumentId::from_uuid(id.into())
}

/// Typed access to one entity collection.
///
/// Wraps a document store and handles the serialization of entities to
/// document bodies and back.
pub struct Repository<S, T>
where
    S: DocumentStore,
    T: Entity,
{
    store: S,
    _phantom: PhantomData<T>,
}

impl<S, T> Clone for Repository<S, T>
where
    S: DocumentStore + Clone,
    T: Entity,
{
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<S, T> Repository<S, T>
where
    S: DocumentStore,
    T: Entity,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying document store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Starts a memoized lookup that projects each loaded entity with
    /// `project`, for resolving references while building listings.
    pub fn lookup<V: Clone>(&self, project: fn(T) -> V) -> Lookup<'_, S, T, V> {
        Lookup {
            repository: self,
            project,
            resolved: HashMap::new(),
        }
    }

    /// Starts a query over this entity's collection.
    pub fn query(&self) -> DocumentQuery {
        DocumentQuery::new(T::COLLECTION)
    }

    fn to_document(entity: &T) -> Result<Document, DomainError> {
        let document = Document::builder()
            .id(document_id::<T>(entity.id()))
            .collection(T::COLLECTION)
            .created_at(entity.created_at())
            .body(entity)?
            .try_build();

        document.ok_or_else(|| DomainError::invalid(format!("{} has no body", T::NAME)))
    }

    /// Persists a new entity.
    pub async fn insert(&self, entity: &T) -> Result<(), DomainError> {
        self.store.insert(Self::to_document(entity)?).await?;
        Ok(())
    }

    /// Overwrites an existing entity. Fails with `NotFound` if it is gone.
    pub async fn save(&self, entity: &T) -> Result<(), DomainError> {
        if self.store.replace(Self::to_document(entity)?).await? {
            Ok(())
        } else {
            Err(DomainError::not_found(T::NAME, entity.id()))
        }
    }

    /// Loads an entity, returning None if it doesn't exist.
    pub async fn get(&self, id: T::Id) -> Result<Option<T>, DomainError> {
        match self.store.get(T::COLLECTION, document_id::<T>(id)).await? {
            Some(document) => Ok(Some(document.into_decoded()?)),
            None => Ok(None),
        }
    }

    /// Loads an entity, failing with `NotFound` if it doesn't exist.
    pub async fn require(&self, id: T::Id) -> Result<T, DomainError> {
        self.get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(T::NAME, id))
    }

    /// Removes an entity, failing with `NotFound` if it doesn't exist.
    pub async fn delete(&self, id: T::Id) -> Result<T, DomainError> {
        match self.store.delete(T::COLLECTION, document_id::<T>(id)).await? {
            Some(document) => Ok(document.into_decoded()?),
            None => Err(DomainError::not_found(T::NAME, id)),
        }
    }

    /// Runs a query and decodes every match.
    pub async fn find(&self, query: DocumentQuery) -> Result<Vec<T>, DomainError> {
        self.store
            .find(query)
            .await?
            .into_iter()
            .map(|document| document.into_decoded().map_err(DomainError::from))
            .collect()
    }

    /// Counts the entities matching all filters.
    pub async fn count(&self, filters: &[FieldFilter]) -> Result<u64, DomainError> {
        Ok(self.store.count(T::COLLECTION, filters).await?)
    }

    /// Counts the entities matching all filters and averages a numeric field
    /// over them.
    pub async fn summarize(
        &self,
        filters: &[FieldFilter],
        field: &str,
    ) -> Result<NumericSummary, DomainError> {
        Ok(self.store.summarize(T::COLLECTION, filters, field).await?)
    }
}

/// Point lookups by id, each id loaded at most once.
///
/// References are weak: an id whose entity is gone resolves to `None`.
pub struct Lookup<'a, S, T, V>
where
    S: DocumentStore,
    T: Entity,
{
    repository: &'a Repository<S, T>,
    project: fn(T) -> V,
    resolved: HashMap<T::Id, Option<V>>,
}

impl<S, T, V> Lookup<'_, S, T, V>
where
    S: DocumentStore,
    T: Entity,
    V: Clone,
{
    pub async fn get(&mut self, id: T::Id) -> Result<Option<V>, DomainError> {
        if let Some(value) = self.resolved.get(&id) {
            return Ok(value.clone());
        }
        let value = self.repository.get(id).await?.map(self.project);
        self.resolved.insert(id, value.clone());
        Ok(value)
    }
}
