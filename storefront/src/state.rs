//! Application state management

use std::sync::Arc;

use crate::auth::PasswordHasher;
use crate::config::{Config, StoreBackend};
use crate::error::{Error, Result};
use crate::middleware::RolePolicy;
use crate::models::Resource;
use crate::repository::{DocumentRepository, ProductLookup};
use crate::store::{DocumentStore, MemoryStore};

/// Application state shared across handlers
///
/// Everything in here is immutable after startup; cloning is a handful of
/// reference count bumps.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn DocumentStore>,
    hasher: PasswordHasher,
    policy: Arc<RolePolicy>,
}

impl AppState {
    /// Create state over an already connected store
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> Result<Self> {
        let hasher = PasswordHasher::new(&config.password)?;
        let policy = Arc::new(RolePolicy::from(&config.access));

        Ok(Self {
            config: Arc::new(config),
            store,
            hasher,
            policy,
        })
    }

    /// Connect the configured store backend and create state over it
    pub async fn connect(config: Config) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = match config.store.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on shutdown");
                Arc::new(MemoryStore::new())
            }
            StoreBackend::Surrealdb => connect_surrealdb(&config).await?,
        };

        Self::new(config, store)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn policy(&self) -> &Arc<RolePolicy> {
        &self.policy
    }

    /// Repository for one resource type
    pub fn repository<R: Resource>(&self) -> DocumentRepository<R> {
        DocumentRepository::new(self.store.clone(), self.hasher.clone())
    }

    pub fn product_lookup(&self) -> ProductLookup {
        ProductLookup::new(self.store.clone())
    }
}

#[cfg(feature = "surrealdb")]
async fn connect_surrealdb(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    let surreal = config.store.surrealdb.as_ref().ok_or_else(|| {
        Error::Config(Box::new(figment::Error::from(
            "store.surrealdb must be set when store.backend is \"surrealdb\"".to_string(),
        )))
    })?;
    let store = crate::store::SurrealStore::connect(surreal).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "surrealdb"))]
async fn connect_surrealdb(_config: &Config) -> Result<Arc<dyn DocumentStore>> {
    Err(Error::Config(Box::new(figment::Error::from(
        "store.backend is \"surrealdb\" but this build lacks the `surrealdb` feature".to_string(),
    ))))
}
