//! Document store collaborator for the storefront.
//!
//! Entities are persisted as JSON documents grouped into collections. The
//! [`DocumentStore`] trait covers point lookups, whole-document writes,
//! filtered/sorted/windowed queries and a numeric group summary. Two
//! implementations are provided: [`InMemoryDocumentStore`] and
//! [`PostgresDocumentStore`].

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use document::{Document, DocumentBuilder, DocumentId};
pub use error::{Result, StoreError};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use query::{DocumentQuery, FieldFilter, SortDirection, SortKey, SortOrder};
pub use store::{DocumentStore, DocumentStoreExt, NumericSummary};
