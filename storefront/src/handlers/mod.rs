//! HTTP handlers
//!
//! The CRUD handlers are generic over [`Resource`](crate::models::Resource):
//! one set of functions serves products, orders and users, monomorphized per
//! route in [`crate::routes`].

mod health;
mod orders;
mod resource;

pub use health::{health, readiness, DependencyStatus, HealthResponse, ReadinessResponse};
pub use orders::order_products;
pub use resource::{create, get, list, remove, update, JsonBody, TOTAL_COUNT_HEADER};
