//! Document store abstraction.
//!
//! Documents are JSON objects addressed by a slash-separated path whose last
//! segment is the document id and whose prefix is the collection, e.g.
//! `users/{uid}/resumes/{resume_id}`. Backends offer point reads and writes,
//! partial field updates with an optional single-document precondition, and
//! equality-filtered, ordered collection queries. No backend is required to
//! provide transactions spanning more than one document.

pub mod error;
pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

// ────────────────────────────────────────────────────────────────────────────
// Paths
// ────────────────────────────────────────────────────────────────────────────

/// A collection address: an odd number of segments, e.g. `templates` or
/// `users/{uid}/resumes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

/// A document address: a collection plus a document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    collection: CollectionPath,
    id: String,
}

fn check_segment(segment: &str) -> StoreResult<()> {
    if segment.is_empty() || segment.contains('/') || segment.trim() != segment {
        return Err(StoreError::InvalidPath(format!(
            "invalid path segment '{segment}'"
        )));
    }
    Ok(())
}

impl CollectionPath {
    /// A top-level collection.
    pub fn root(name: &str) -> StoreResult<Self> {
        check_segment(name)?;
        Ok(Self(name.to_string()))
    }

    /// A subcollection under a document.
    pub fn under(parent: &DocPath, name: &str) -> StoreResult<Self> {
        check_segment(name)?;
        Ok(Self(format!("{}/{}", parent.as_string(), name)))
    }

    pub fn doc(&self, id: &str) -> StoreResult<DocPath> {
        check_segment(id)?;
        Ok(DocPath {
            collection: self.clone(),
            id: id.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DocPath {
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn as_string(&self) -> String {
        format!("{}/{}", self.collection.0, self.id)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Updates, preconditions and queries
// ────────────────────────────────────────────────────────────────────────────

/// A single top-level field mutation applied by [`DocumentStore::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Set { field: String, value: Value },
    /// Atomic integer increment. A missing field counts as 0.
    Increment { field: String, by: i64 },
}

impl FieldUpdate {
    pub fn set(field: &str, value: impl Into<Value>) -> Self {
        FieldUpdate::Set {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn increment(field: &str, by: i64) -> Self {
        FieldUpdate::Increment {
            field: field.to_string(),
            by,
        }
    }
}

/// Compare-and-swap guard: the update applies only if the stored top-level
/// `field` equals `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Precondition {
    pub field: String,
    pub value: Value,
}

impl Precondition {
    pub fn field_equals(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

/// Equality filters and an optional single-field ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait
// ────────────────────────────────────────────────────────────────────────────

/// Hierarchical JSON document store.
///
/// Carried by the data-access layer as `Arc<dyn DocumentStore>`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns `Ok(None)` when the document does not exist.
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Value>>;

    /// Inserts a new document. Fails with [`StoreError::AlreadyExists`] if
    /// the path is taken.
    async fn create(&self, path: &DocPath, data: Value) -> StoreResult<()>;

    /// Inserts or fully replaces a document.
    async fn set(&self, path: &DocPath, data: Value) -> StoreResult<()>;

    /// Applies field updates to an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] when the document is missing and
    /// with [`StoreError::PreconditionFailed`] when `precondition` does not
    /// hold. Either way nothing is written.
    async fn update(
        &self,
        path: &DocPath,
        updates: &[FieldUpdate],
        precondition: Option<&Precondition>,
    ) -> StoreResult<()>;

    /// Returns `true` if a document was removed.
    async fn delete(&self, path: &DocPath) -> StoreResult<bool>;

    async fn query(&self, collection: &CollectionPath, query: &Query) -> StoreResult<Vec<Value>>;
}
