use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Unique identifier for a document within its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Creates a new random document ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a document ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<DocumentId> for Uuid {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

/// A stored document: a JSON body plus the envelope fields the store indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier, unique within the collection.
    pub id: DocumentId,

    /// The collection this document belongs to (e.g., "products", "orders").
    pub collection: String,

    /// When the document was first created. Drives newest-first ordering.
    pub created_at: DateTime<Utc>,

    /// The document body as JSON.
    pub body: serde_json::Value,
}

impl Document {
    /// Creates a new document builder.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::default()
    }

    /// Deserializes the body into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body.clone())
    }

    /// Consumes the document and deserializes its body.
    pub fn into_decoded<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body)
    }
}

/// Builder for constructing documents.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    id: Option<DocumentId>,
    collection: Option<String>,
    created_at: Option<DateTime<Utc>>,
    body: Option<serde_json::Value>,
}

impl DocumentBuilder {
    /// Sets the document ID. If not set, a new ID will be generated.
    pub fn id(mut self, id: impl Into<DocumentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the collection.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Sets the creation time. If not set, the current time will be used.
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Sets the body from a serializable value.
    pub fn body<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Sets the body from a raw JSON value.
    pub fn body_raw(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Builds the document, returning None if the collection or body is missing.
    pub fn try_build(self) -> Option<Document> {
        Some(Document {
            id: self.id.unwrap_or_default(),
            collection: self.collection?,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            body: self.body?,
        })
    }
}
