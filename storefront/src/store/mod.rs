//! Document store abstraction
//!
//! Repositories never talk to a database directly; they are handed an
//! `Arc<dyn DocumentStore>` at construction time. Documents are JSON objects
//! grouped into named collections and keyed by their `id` field.
//!
//! Two backends ship with the service:
//!
//! - [`MemoryStore`]: process-local, insertion-ordered (default)
//! - `SurrealStore`: SurrealDB over any supported protocol (feature `surrealdb`)

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::query::{FilterCondition, Pagination, SortSpec};

mod memory;
#[cfg(feature = "surrealdb")]
mod surreal;

pub use memory::MemoryStore;
#[cfg(feature = "surrealdb")]
pub use surreal::{sanitize_url, SurrealStore};

/// Field every stored document is keyed by
pub const ID_FIELD: &str = "id";

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Document store failures
///
/// None of these are domain outcomes; a missing document is `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend cannot be reached
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    /// Backend rejected or failed a query
    #[error("Document store query failed: {0}")]
    Query(String),

    /// A stored document could not be read back
    #[error("Corrupt document in '{collection}': {message}")]
    Corrupt { collection: String, message: String },

    /// Insert with an id that is already taken
    #[error("Document '{id}' already exists in '{collection}'")]
    DuplicateId { collection: String, id: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    pub fn corrupt(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Transient failures that may succeed on retry
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Injected document store handle
///
/// Every method is a single store round trip. Nothing here retries.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name used in logs and readiness output
    fn backend(&self) -> &'static str;

    /// Insert a new document; its `id` field must be set
    async fn insert(&self, collection: &str, document: Value) -> StoreResult<()>;

    /// Fetch one document by id
    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Fetch every document whose id is in `ids`, in store order
    async fn find_by_ids(&self, collection: &str, ids: &[String]) -> StoreResult<Vec<Value>>;

    /// Documents matching all `filters`, ordered by `sort` (insertion order
    /// when absent) and cut to `pagination`
    async fn find(
        &self,
        collection: &str,
        filters: &[FilterCondition],
        sort: Option<&SortSpec>,
        pagination: Option<Pagination>,
    ) -> StoreResult<Vec<Value>>;

    /// First document matching all `filters`, skipping `exclude_id`
    async fn find_one(
        &self,
        collection: &str,
        filters: &[FilterCondition],
        exclude_id: Option<&str>,
    ) -> StoreResult<Option<Value>>;

    /// Number of documents matching all `filters`
    async fn count(&self, collection: &str, filters: &[FilterCondition]) -> StoreResult<u64>;

    /// Replace a stored document wholesale; `false` if it no longer exists
    async fn replace(&self, collection: &str, id: &str, document: Value) -> StoreResult<bool>;

    /// Remove a document; `false` if it did not exist
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// Cheap round trip used by the readiness probe
    async fn ping(&self) -> StoreResult<()>;
}

/// The `id` field of a document, if it has a string one
pub fn document_id(document: &Value) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable() {
        assert!(StoreError::unavailable("connection refused").is_retriable());
        assert!(!StoreError::query("parse error").is_retriable());
        assert!(!StoreError::corrupt("product", "missing name").is_retriable());
    }

    #[test]
    fn test_display() {
        let err = StoreError::corrupt("order", "bad total");
        assert_eq!(err.to_string(), "Corrupt document in 'order': bad total");
    }

    #[test]
    fn test_document_id() {
        let doc = serde_json::json!({"id": "abc", "name": "Foo"});
        assert_eq!(document_id(&doc), Some("abc"));
        assert_eq!(document_id(&serde_json::json!({"name": "Foo"})), None);
    }
}
