//! In-process document store
//!
//! Collections are insertion-ordered vectors of JSON documents behind a
//! single `tokio::sync::RwLock`. Sorting is stable and orders mixed types the
//! way document databases do: missing/null < numbers < strings < objects <
//! arrays < booleans.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{document_id, DocumentStore, StoreError, StoreResult};
use crate::query::{FilterCondition, OrderDirection, Pagination, SortSpec};

/// Process-local document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, collection: &str, document: Value) -> StoreResult<()> {
        let id = document_id(&document)
            .ok_or_else(|| StoreError::query(format!("document for '{}' has no id", collection)))?
            .to_string();

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();
        if documents.iter().any(|d| document_id(d) == Some(id.as_str())) {
            return Err(StoreError::DuplicateId {
                collection: collection.to_string(),
                id,
            });
        }
        documents.push(document);
        Ok(())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| document_id(d) == Some(id)))
            .cloned())
    }

    async fn find_by_ids(&self, collection: &str, ids: &[String]) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| document_id(d).is_some_and(|id| ids.iter().any(|i| i == id)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find(
        &self,
        collection: &str,
        filters: &[FilterCondition],
        sort: Option<&SortSpec>,
        pagination: Option<Pagination>,
    ) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Value> = documents
            .iter()
            .filter(|d| matches_all(d, filters))
            .collect();

        if let Some(sort) = sort {
            // Stable ascending sort; descending is its exact reverse, ties included
            matched.sort_by(|a, b| compare_values(lookup(a, &sort.field), lookup(b, &sort.field)));
            if sort.direction == OrderDirection::Descending {
                matched.reverse();
            }
        }

        let (skip, take) = match pagination {
            Some(p) => (to_usize(p.offset), to_usize(p.limit)),
            None => (0, usize::MAX),
        };

        Ok(matched.into_iter().skip(skip).take(take).cloned().collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        filters: &[FilterCondition],
        exclude_id: Option<&str>,
    ) -> StoreResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| {
                docs.iter().find(|d| {
                    matches_all(d, filters)
                        && exclude_id.map_or(true, |excluded| document_id(d) != Some(excluded))
                })
            })
            .cloned())
    }

    async fn count(&self, collection: &str, filters: &[FilterCondition]) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        let count = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches_all(d, filters)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn replace(&self, collection: &str, id: &str, document: Value) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let slot = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| document_id(d) == Some(id)));
        match slot {
            Some(existing) => {
                *existing = document;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = documents.len();
        documents.retain(|d| document_id(d) != Some(id));
        Ok(documents.len() != before)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// Resolve a dotted path such as `shoppingCart.total`
fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(document, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn matches_all(document: &Value, filters: &[FilterCondition]) -> bool {
    filters.iter().all(|filter| {
        let expected = filter.value.to_json();
        lookup(document, &filter.field).is_some_and(|actual| values_equal(actual, &expected))
    })
}

/// Equality with numbers compared by value, so `3` matches `3.0`
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == expected,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Array(x)), Some(Value::Array(y))) => x
            .iter()
            .zip(y.iter())
            .map(|(l, r)| compare_values(Some(l), Some(r)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Some(x @ Value::Object(_)), Some(y @ Value::Object(_))) => {
            x.to_string().cmp(&y.to_string())
        }
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for doc in [
            json!({"id": "1", "name": "Foo", "role": "user", "rating": 3, "cart": {"total": 10.5}}),
            json!({"id": "2", "name": "Bar", "role": "admin", "rating": 5, "cart": {"total": 2.0}}),
            json!({"id": "3", "name": "Baz", "role": "user", "rating": 1}),
        ] {
            store.insert("things", doc).await.unwrap();
        }
        store
    }

    fn ids(docs: &[Value]) -> Vec<&str> {
        docs.iter().filter_map(document_id).collect()
    }

    #[tokio::test]
    async fn test_insertion_order_without_sort() {
        let store = seeded().await;
        let docs = store.find("things", &[], None, None).await.unwrap();
        assert_eq!(ids(&docs), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = seeded().await;
        let err = store
            .insert("things", json!({"id": "1", "name": "Again"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
    }

    #[tokio::test]
    async fn test_missing_id_rejected() {
        let store = MemoryStore::new();
        assert!(store.insert("things", json!({"name": "x"})).await.is_err());
    }

    #[tokio::test]
    async fn test_filter_equality() {
        let store = seeded().await;
        let docs = store
            .find("things", &[FilterCondition::eq("name", "Foo")], None, None)
            .await
            .unwrap();
        assert_eq!(ids(&docs), vec!["1"]);

        let docs = store
            .find("things", &[FilterCondition::eq("rating", 5_i64)], None, None)
            .await
            .unwrap();
        assert_eq!(ids(&docs), vec!["2"]);

        // Type mismatch matches nothing
        let docs = store
            .find("things", &[FilterCondition::eq("rating", "5")], None, None)
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_sort_directions() {
        let store = seeded().await;
        let asc = store
            .find("things", &[], Some(&SortSpec::new("rating", OrderDirection::Ascending)), None)
            .await
            .unwrap();
        let desc = store
            .find("things", &[], Some(&SortSpec::new("rating", OrderDirection::Descending)), None)
            .await
            .unwrap();
        assert_eq!(ids(&asc), vec!["3", "1", "2"]);
        assert_eq!(ids(&desc), vec!["2", "1", "3"]);
    }

    #[tokio::test]
    async fn test_descending_reverses_ties() {
        let store = seeded().await;
        let asc = store
            .find("things", &[], Some(&SortSpec::new("role", OrderDirection::Ascending)), None)
            .await
            .unwrap();
        let desc = store
            .find("things", &[], Some(&SortSpec::new("role", OrderDirection::Descending)), None)
            .await
            .unwrap();
        assert_eq!(ids(&asc), vec!["2", "1", "3"]);
        assert_eq!(ids(&desc), vec!["3", "1", "2"]);
    }

    #[tokio::test]
    async fn test_sort_dotted_path_and_missing_values() {
        let store = seeded().await;
        let docs = store
            .find("things", &[], Some(&SortSpec::new("cart.total", OrderDirection::Ascending)), None)
            .await
            .unwrap();
        // Missing sorts first
        assert_eq!(ids(&docs), vec!["3", "2", "1"]);
    }

    #[tokio::test]
    async fn test_unknown_sort_field() {
        let store = seeded().await;
        let asc = store
            .find("things", &[], Some(&SortSpec::new("nope", OrderDirection::Ascending)), None)
            .await
            .unwrap();
        assert_eq!(ids(&asc), vec!["1", "2", "3"]);

        let desc = store
            .find("things", &[], Some(&SortSpec::new("nope", OrderDirection::Descending)), None)
            .await
            .unwrap();
        assert_eq!(ids(&desc), vec!["3", "2", "1"]);
    }

    #[tokio::test]
    async fn test_pagination() {
        let store = seeded().await;
        let docs = store
            .find("things", &[], None, Some(Pagination::new(2, 2)))
            .await
            .unwrap();
        assert_eq!(ids(&docs), vec!["3"]);

        let docs = store
            .find("things", &[], None, Some(Pagination::new(0, 2)))
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[tokio::test]
    async fn test_find_one_excludes_id() {
        let store = seeded().await;
        let filters = [FilterCondition::eq("name", "Foo")];
        assert!(store.find_one("things", &filters, None).await.unwrap().is_some());
        assert!(store.find_one("things", &filters, Some("1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_count_replace_delete() {
        let store = seeded().await;
        assert_eq!(
            store.count("things", &[FilterCondition::eq("role", "user")]).await.unwrap(),
            2
        );

        let replaced = store
            .replace("things", "3", json!({"id": "3", "name": "Qux", "role": "admin"}))
            .await
            .unwrap();
        assert!(replaced);
        assert_eq!(
            store.count("things", &[FilterCondition::eq("role", "user")]).await.unwrap(),
            1
        );
        assert!(!store.replace("things", "9", json!({"id": "9"})).await.unwrap());

        assert!(store.delete("things", "3").await.unwrap());
        assert!(!store.delete("things", "3").await.unwrap());
        assert!(store.find_by_id("things", "3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_ids() {
        let store = seeded().await;
        let docs = store
            .find_by_ids("things", &["3".to_string(), "1".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(ids(&docs), vec!["1", "3"]);
    }

    #[test]
    fn test_type_order() {
        let null = json!(null);
        let num = json!(1);
        let text = json!("a");
        let obj = json!({});
        let arr = json!([]);
        let flag = json!(false);
        let ordered = [None, Some(&null), Some(&num), Some(&text), Some(&obj), Some(&arr), Some(&flag)];
        for pair in ordered.windows(2) {
            assert_ne!(compare_values(pair[0], pair[1]), Ordering::Greater);
        }
        assert_eq!(compare_values(Some(&num), Some(&text)), Ordering::Less);
        assert_eq!(compare_values(Some(&flag), Some(&arr)), Ordering::Greater);
    }
}
