use std::cmp::Ordering;

use serde_json::Value;

use crate::Document;

/// A predicate over one or more top-level fields of a document body.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// The field equals the given JSON value exactly.
    Equals { field: String, value: Value },

    /// The field is an array of strings sharing at least one element with `values`.
    ContainsAny { field: String, values: Vec<String> },

    /// The field is an integer within the inclusive bounds. Either bound may be absent.
    Range {
        field: String,
        min: Option<i64>,
        max: Option<i64>,
    },

    /// At least one of the fields is a string containing `needle`, ignoring case.
    TextMatch { fields: Vec<String>, needle: String },
}

impl FieldFilter {
    /// Matches documents whose `field` equals `value`.
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Matches documents whose array `field` intersects `values`.
    pub fn contains_any<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self::ContainsAny {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Matches documents whose integer `field` lies in `[min, max]`.
    pub fn range(field: impl Into<String>, min: Option<i64>, max: Option<i64>) -> Self {
        Self::Range {
            field: field.into(),
            min,
            max,
        }
    }

    /// Matches documents where any of `fields` contains `needle` case-insensitively.
    pub fn text<I, F>(fields: I, needle: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        Self::TextMatch {
            fields: fields.into_iter().map(Into::into).collect(),
            needle: needle.into(),
        }
    }

    /// Evaluates the filter against a document body.
    pub fn matches(&self, body: &Value) -> bool {
        match self {
            FieldFilter::Equals { field, value } => body.get(field) == Some(value),
            FieldFilter::ContainsAny { field, values } => body
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .any(|item| values.iter().any(|v| v == item))
                }),
            FieldFilter::Range { field, min, max } => {
                let Some(n) = body.get(field).and_then(Value::as_i64) else {
                    return false;
                };
                min.is_none_or(|min| n >= min) && max.is_none_or(|max| n <= max)
            }
            FieldFilter::TextMatch { fields, needle } => {
                let needle = needle.to_lowercase();
                fields.iter().any(|field| {
                    body.get(field)
                        .and_then(Value::as_str)
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                })
            }
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// What to sort documents by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// The document creation timestamp.
    CreatedAt,
    /// A numeric top-level body field.
    Number(String),
}

/// Primary sort order. Ties are always broken by ascending document id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortOrder {
    /// Most recently created first.
    pub fn newest_first() -> Self {
        Self {
            key: SortKey::CreatedAt,
            direction: SortDirection::Descending,
        }
    }

    /// Sorts by a numeric body field.
    pub fn by_number(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: SortKey::Number(field.into()),
            direction,
        }
    }

    /// Compares two documents under this order, including the id tie-break.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let primary = match &self.key {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Number(field) => {
                let x = a.body.get(field).and_then(Value::as_f64);
                let y = b.body.get(field).and_then(Value::as_f64);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        };
        let primary = match self.direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::newest_first()
    }
}

/// Builder for document queries over a single collection.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    /// The collection to search.
    pub collection: String,

    /// All filters must match (AND).
    pub filters: Vec<FieldFilter>,

    /// Result ordering.
    pub sort: SortOrder,

    /// Number of documents to skip.
    pub offset: Option<usize>,

    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl DocumentQuery {
    /// Creates an unfiltered, newest-first query over a collection.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            sort: SortOrder::default(),
            offset: None,
            limit: None,
        }
    }

    /// Adds a filter.
    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds several filters.
    pub fn filters(mut self, filters: impl IntoIterator<Item = FieldFilter>) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Sets the sort order.
    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Skips this many documents before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Limits the number of documents returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if every filter matches the document body.
    pub fn matches(&self, document: &Document) -> bool {
        document.collection == self.collection
            && self.filters.iter().all(|f| f.matches(&document.body))
    }
}
