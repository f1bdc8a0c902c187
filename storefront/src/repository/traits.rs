//! Repository trait definitions
//!
//! Traits use RPITIT (Return Position Impl Trait In Traits), so implementors
//! write plain `async fn`s while callers still get `Send` futures.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use super::error::RepositoryError;
use crate::query::QueryOptions;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// CRUD operations for one resource type
///
/// # Type Parameters
///
/// - `Id`: The identifier type for the entity
/// - `Entity`: The full entity type returned from queries
/// - `Create`: The data transfer object for creating new entities
/// - `Update`: The partial-field object for updating existing entities
pub trait Repository<Id, Entity, Create, Update>: Send + Sync {
    /// Validate, check uniqueness and insert
    ///
    /// Fails with `AlreadyExists` when another entity holds the unique value.
    fn create(&self, data: Create) -> impl Future<Output = RepositoryResult<Entity>> + Send;

    /// Fetch one entity, failing with `NotFound` when absent
    fn get(&self, id: &Id) -> impl Future<Output = RepositoryResult<Entity>> + Send;

    /// Entities matching the options' filter, sort and pagination
    fn list(
        &self,
        options: &QueryOptions,
    ) -> impl Future<Output = RepositoryResult<Vec<Entity>>> + Send;

    /// Number of entities matching the options' filter; sort and pagination
    /// are ignored
    fn count(&self, options: &QueryOptions) -> impl Future<Output = RepositoryResult<u64>> + Send;

    /// Merge partial fields into an existing entity and persist it
    ///
    /// The uniqueness check runs again only when the update carries the
    /// unique field, and never matches the entity itself.
    fn update(
        &self,
        id: &Id,
        data: Update,
    ) -> impl Future<Output = RepositoryResult<Entity>> + Send;

    /// Delete an entity, returning its last state
    fn remove(&self, id: &Id) -> impl Future<Output = RepositoryResult<Entity>> + Send;
}

/// Batch loading of referenced entities (N+1 prevention)
///
/// References are weak: ids with no matching entity are simply absent from
/// the returned map.
pub trait RelationLoader<RelatedId, Related>: Send + Sync
where
    RelatedId: Eq + Hash,
{
    /// Load every referenced entity in a single store query
    fn batch_load(
        &self,
        ids: &[RelatedId],
    ) -> impl Future<Output = RepositoryResult<HashMap<RelatedId, Related>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Eq, Hash)]
    struct RelatedId(String);

    #[derive(Clone)]
    struct RelatedEntity {
        id: RelatedId,
    }

    struct MockRelationLoader {
        known: Vec<RelatedId>,
    }

    impl RelationLoader<RelatedId, RelatedEntity> for MockRelationLoader {
        async fn batch_load(
            &self,
            ids: &[RelatedId],
        ) -> RepositoryResult<HashMap<RelatedId, RelatedEntity>> {
            Ok(ids
                .iter()
                .filter(|id| self.known.contains(id))
                .map(|id| (id.clone(), RelatedEntity { id: id.clone() }))
                .collect())
        }
    }

    #[tokio::test]
    async fn test_relation_loader_skips_unknown_ids() {
        let loader = MockRelationLoader {
            known: vec![RelatedId("1".into())],
        };
        let map = loader
            .batch_load(&[RelatedId("1".into()), RelatedId("2".into())])
            .await
            .unwrap();
        assert_eq!(map.len(), 1);
        assert!(map[&RelatedId("1".into())].id == RelatedId("1".into()));
    }
}
