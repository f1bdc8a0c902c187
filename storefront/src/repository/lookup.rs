//! Product lookup for order cart items

use std::collections::HashMap;
use std::sync::Arc;

use super::error::{RepositoryError, RepositoryOperation};
use super::traits::{RelationLoader, RepositoryResult};
use crate::ids::ResourceId;
use crate::models::{Product, Resource};
use crate::store::DocumentStore;

/// Resolves the products an order references
///
/// Cart items hold weak references, so ids without a stored product are
/// skipped rather than reported.
#[derive(Clone)]
pub struct ProductLookup {
    store: Arc<dyn DocumentStore>,
}

impl ProductLookup {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl RelationLoader<ResourceId, Product> for ProductLookup {
    async fn batch_load(&self, ids: &[ResourceId]) -> RepositoryResult<HashMap<ResourceId, Product>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let keys: Vec<String> = ids.iter().map(ToString::to_string).collect();
        let documents = self
            .store
            .find_by_ids(Product::COLLECTION, &keys)
            .await
            .map_err(|e| RepositoryError::store(RepositoryOperation::BatchLoad, e))?;

        let products = documents
            .into_iter()
            .map(|document| {
                serde_json::from_value::<Product>(document)
                    .map(|product| (product.id, product))
                    .map_err(|e| {
                        RepositoryError::serialization_error(
                            RepositoryOperation::BatchLoad,
                            e.to_string(),
                        )
                    })
            })
            .collect::<RepositoryResult<HashMap<_, _>>>()?;

        tracing::debug!(requested = ids.len(), found = products.len(), "Loaded order products");
        Ok(products)
    }
}
