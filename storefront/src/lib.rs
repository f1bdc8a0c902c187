//! # storefront
//!
//! REST service for products, orders and users over a document store.
//!
//! - **Resources**: validated create, filtered/sorted/paginated list, partial
//!   update and delete, one generic pipeline for every resource type
//! - **Auth**: bearer JWT, per-route permissions expanded from roles, self access
//! - **Storage**: in-memory document store, or SurrealDB with the `surrealdb` feature
//! - **Middleware stack**: request IDs, sensitive header masking, tracing,
//!   body limits, timeouts, compression, CORS, panic recovery
//!
//! ## Example
//!
//! ```rust,no_run
//! use storefront::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::connect(config.clone()).await?;
//!     let app = build_router(state)?;
//!
//!     Server::new(config).serve(app).await
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod query;
pub mod repository;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;
pub mod validation;

/// Common imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::ids::ResourceId;
    pub use crate::middleware::{Claims, JwtAuth, RequirePermission, RolePolicy};
    pub use crate::models::{Order, Product, Resource, User};
    pub use crate::observability::init_tracing;
    pub use crate::query::QueryOptions;
    pub use crate::repository::{DocumentRepository, Repository};
    pub use crate::routes::{build_router, router};
    pub use crate::server::Server;
    pub use crate::state::AppState;
    pub use crate::store::{DocumentStore, MemoryStore};
}
