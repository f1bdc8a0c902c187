//! Generic repository over the document store

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use super::error::{RepositoryError, RepositoryOperation};
use super::traits::{Repository, RepositoryResult};
use crate::auth::PasswordHasher;
use crate::ids::ResourceId;
use crate::models::{Resource, WriteContext};
use crate::query::{FilterCondition, FilterValue, QueryOptions};
use crate::store::DocumentStore;

/// Repository for any [`Resource`], constructed with an injected store
pub struct DocumentRepository<R> {
    store: Arc<dyn DocumentStore>,
    hasher: PasswordHasher,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for DocumentRepository<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            hasher: self.hasher.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R> fmt::Debug for DocumentRepository<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentRepository")
            .field("backend", &self.store.backend())
            .finish()
    }
}

impl<R: Resource> DocumentRepository<R> {
    pub fn new(store: Arc<dyn DocumentStore>, hasher: PasswordHasher) -> Self {
        Self {
            store,
            hasher,
            _resource: PhantomData,
        }
    }

    fn decode(document: Value) -> RepositoryResult<R> {
        serde_json::from_value(document).map_err(|e| {
            RepositoryError::serialization_error(
                RepositoryOperation::FindById,
                format!("stored {} is unreadable: {}", R::ENTITY, e),
            )
        })
    }

    fn encode(entity: &R, operation: RepositoryOperation) -> RepositoryResult<Value> {
        serde_json::to_value(entity)
            .map_err(|e| RepositoryError::serialization_error(operation, e.to_string()))
    }

    /// Fail with `AlreadyExists` when another entity holds `value`
    async fn ensure_unique(
        &self,
        value: FilterValue,
        exclude: Option<&ResourceId>,
        operation: RepositoryOperation,
    ) -> RepositoryResult<()> {
        let Some(unique) = R::UNIQUE else {
            return Ok(());
        };
        let excluded = exclude.map(ToString::to_string);
        let existing = self
            .store
            .find_one(
                R::COLLECTION,
                &[FilterCondition::eq(unique.field, value)],
                excluded.as_deref(),
            )
            .await
            .map_err(|e| RepositoryError::store(operation, e))?;

        if existing.is_some() {
            tracing::warn!(
                entity = R::ENTITY,
                field = unique.field,
                operation = %operation,
                "Uniqueness conflict"
            );
            return Err(
                RepositoryError::already_exists(R::ENTITY, unique.message).with_operation(operation)
            );
        }
        Ok(())
    }
}

impl<R: Resource> Repository<ResourceId, R, R::Create, R::Update> for DocumentRepository<R> {
    async fn create(&self, data: R::Create) -> RepositoryResult<R> {
        let ctx = WriteContext {
            now: Utc::now(),
            hasher: &self.hasher,
        };
        let entity = R::build(ResourceId::new(), data, &ctx)?;
        entity.validate()?;

        if let Some(value) = entity.unique_value() {
            self.ensure_unique(value, None, RepositoryOperation::Create)
                .await?;
        }

        let document = Self::encode(&entity, RepositoryOperation::Create)?;
        self.store
            .insert(R::COLLECTION, document)
            .await
            .map_err(|e| RepositoryError::store(RepositoryOperation::Create, e))?;

        tracing::info!(entity = R::ENTITY, id = %entity.id(), "Created");
        Ok(entity)
    }

    async fn get(&self, id: &ResourceId) -> RepositoryResult<R> {
        let document = self
            .store
            .find_by_id(R::COLLECTION, &id.to_string())
            .await
            .map_err(|e| RepositoryError::store(RepositoryOperation::FindById, e))?
            .ok_or_else(|| RepositoryError::not_found(R::ENTITY, id.to_string()))?;
        Self::decode(document)
    }

    async fn list(&self, options: &QueryOptions) -> RepositoryResult<Vec<R>> {
        let documents = self
            .store
            .find(
                R::COLLECTION,
                &options.filters,
                options.sort.as_ref(),
                options.pagination(),
            )
            .await
            .map_err(|e| RepositoryError::store(RepositoryOperation::FindAll, e))?;

        documents
            .into_iter()
            .map(|document| {
                Self::decode(document).map_err(|e| e.with_operation(RepositoryOperation::FindAll))
            })
            .collect()
    }

    async fn count(&self, options: &QueryOptions) -> RepositoryResult<u64> {
        self.store
            .count(R::COLLECTION, &options.filters)
            .await
            .map_err(|e| RepositoryError::store(RepositoryOperation::Count, e))
    }

    async fn update(&self, id: &ResourceId, data: R::Update) -> RepositoryResult<R> {
        let mut entity = self
            .get(id)
            .await
            .map_err(|e| e.with_operation(RepositoryOperation::Update))?;

        if let Some(value) = R::unique_in_update(&data) {
            self.ensure_unique(value, Some(id), RepositoryOperation::Update)
                .await?;
        }

        let ctx = WriteContext {
            now: Utc::now(),
            hasher: &self.hasher,
        };
        entity
            .merge(data, &ctx)
            .map_err(|e| e.with_operation(RepositoryOperation::Update))?;
        entity
            .validate()
            .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::Update))?;

        let document = Self::encode(&entity, RepositoryOperation::Update)?;
        let replaced = self
            .store
            .replace(R::COLLECTION, &id.to_string(), document)
            .await
            .map_err(|e| RepositoryError::store(RepositoryOperation::Update, e))?;
        if !replaced {
            return Err(RepositoryError::not_found(R::ENTITY, id.to_string())
                .with_operation(RepositoryOperation::Update));
        }

        tracing::info!(entity = R::ENTITY, id = %id, "Updated");
        Ok(entity)
    }

    async fn remove(&self, id: &ResourceId) -> RepositoryResult<R> {
        let entity = self
            .get(id)
            .await
            .map_err(|e| e.with_operation(RepositoryOperation::Delete))?;

        let deleted = self
            .store
            .delete(R::COLLECTION, &id.to_string())
            .await
            .map_err(|e| RepositoryError::store(RepositoryOperation::Delete, e))?;
        if !deleted {
            return Err(RepositoryError::not_found(R::ENTITY, id.to_string())
                .with_operation(RepositoryOperation::Delete));
        }

        tracing::info!(entity = R::ENTITY, id = %id, "Removed");
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PasswordConfig;
    use crate::models::{CreateUser, Product, UpdateProduct, UpdateUser, User};
    use crate::query::{OrderDirection, SortSpec};
    use crate::repository::RepositoryErrorKind;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(MemoryStore::new())
    }

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(&PasswordConfig {
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    fn product(name: &str, rating: i64) -> <Product as Resource>::Create {
        serde_json::from_value(json!({
            "name": name,
            "avatarUrl": "https://example.com/a.png",
            "rating": rating,
            "quantity": 5,
            "price": 9.99
        }))
        .unwrap()
    }

    fn user(name: &str, email: &str) -> CreateUser {
        CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password: "password1".to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = DocumentRepository::<Product>::new(store(), hasher());
        let created = repo.create(product("Foo", 3)).await.unwrap();
        let fetched = repo.get(&created.id).await.unwrap();
        assert_eq!(created, fetched);
        // Reads without writes are stable
        assert_eq!(repo.get(&created.id).await.unwrap(), fetched);
    }

    #[tokio::test]
    async fn test_invalid_create_persists_nothing() {
        let repo = DocumentRepository::<Product>::new(store(), hasher());
        let err = repo.create(product("Foo", 9)).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::ValidationFailed);
        assert_eq!(repo.count(&QueryOptions::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let repo = DocumentRepository::<Product>::new(store(), hasher());
        let err = repo.get(&ResourceId::new()).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_unique_on_create() {
        let repo = DocumentRepository::<Product>::new(store(), hasher());
        repo.create(product("Foo", 3)).await.unwrap();
        let err = repo.create(product("Foo", 4)).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::AlreadyExists);
        assert_eq!(err.message, "Name already taken");
    }

    #[tokio::test]
    async fn test_list_filter_sort_paginate() {
        let repo = DocumentRepository::<Product>::new(store(), hasher());
        let a = repo.create(product("Foo", 3)).await.unwrap();
        let b = repo.create(product("Bar", 5)).await.unwrap();
        let c = repo.create(product("Baz", 1)).await.unwrap();

        let all = repo.list(&QueryOptions::default()).await.unwrap();
        assert_eq!(all, vec![a.clone(), b.clone(), c.clone()]);

        let only_foo = repo
            .list(&QueryOptions::default().with_filter(FilterCondition::eq("name", "Foo")))
            .await
            .unwrap();
        assert_eq!(only_foo, vec![a.clone()]);

        let by_rating = repo
            .list(&QueryOptions::default().with_sort(SortSpec::new("rating", OrderDirection::Descending)))
            .await
            .unwrap();
        assert_eq!(by_rating, vec![b.clone(), a.clone(), c.clone()]);

        let page = repo
            .list(&QueryOptions::default().with_limit(2).with_page(2))
            .await
            .unwrap();
        assert_eq!(page, vec![c]);

        let options = QueryOptions::default().with_limit(1);
        assert_eq!(repo.count(&options).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_merges_and_validates() {
        let repo = DocumentRepository::<Product>::new(store(), hasher());
        let created = repo.create(product("Foo", 3)).await.unwrap();

        let update = UpdateProduct {
            rating: Some(5.0.into()),
            ..Default::default()
        };
        let updated = repo.update(&created.id, update).await.unwrap();
        assert_eq!(updated.rating, 5);
        assert_eq!(updated.name, "Foo");

        let bad = UpdateProduct {
            rating: Some(0.0.into()),
            ..Default::default()
        };
        let err = repo.update(&created.id, bad).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::ValidationFailed);
        assert_eq!(err.operation, RepositoryOperation::Update);
        // Nothing modified
        assert_eq!(repo.get(&created.id).await.unwrap().rating, 5);
    }

    #[tokio::test]
    async fn test_update_missing() {
        let repo = DocumentRepository::<Product>::new(store(), hasher());
        let err = repo
            .update(&ResourceId::new(), UpdateProduct::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::NotFound);
        assert_eq!(err.operation, RepositoryOperation::Update);
    }

    #[tokio::test]
    async fn test_update_email_uniqueness() {
        let repo = DocumentRepository::<User>::new(store(), hasher());
        let x = repo.create(user("X", "x@example.com")).await.unwrap();
        let y = repo.create(user("Y", "y@example.com")).await.unwrap();

        let err = repo
            .update(
                &x.id,
                UpdateUser {
                    email: Some(y.email.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::AlreadyExists);
        assert_eq!(err.message, "Email already taken");

        let same = repo
            .update(
                &x.id,
                UpdateUser {
                    email: Some(x.email.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.email, "x@example.com");
    }

    #[tokio::test]
    async fn test_remove_returns_last_state() {
        let repo = DocumentRepository::<Product>::new(store(), hasher());
        let created = repo.create(product("Foo", 3)).await.unwrap();
        let removed = repo.remove(&created.id).await.unwrap();
        assert_eq!(removed, created);

        let err = repo.remove(&created.id).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::NotFound);
        assert_eq!(err.operation, RepositoryOperation::Delete);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_serialization_error() {
        let store = store();
        let id = ResourceId::new();
        store
            .insert(Product::COLLECTION, json!({"id": id.to_string(), "name": 42}))
            .await
            .unwrap();
        let repo = DocumentRepository::<Product>::new(store, hasher());
        let err = repo.get(&id).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::SerializationError);
    }
}
