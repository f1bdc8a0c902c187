//! Route table
//!
//! | Path                       | Read permission | Write permission  |
//! |----------------------------|-----------------|-------------------|
//! | `/v1/product[/{id}]`       | `getProducts`   | `manageProducts`  |
//! | `/v1/order[/{id}]`         | `getOrders`     | `manageOrders`    |
//! | `/v1/order/{id}/products`  | `getOrders`     |                   |
//! | `/v1/users[/{id}]`         | `getUsers`      | `manageUsers`     |
//!
//! `/health` and `/ready` need no token.

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post, MethodRouter},
    Router,
};

use crate::error::Result;
use crate::handlers;
use crate::middleware::{JwtAuth, RequirePermission, RolePolicy};
use crate::models::{Order, Product, Resource, User};
use crate::state::AppState;

/// Permissions guarding one resource's routes
#[derive(Debug, Clone, Copy)]
struct Permissions {
    read: &'static str,
    manage: &'static str,
}

const PRODUCTS: Permissions = Permissions {
    read: "getProducts",
    manage: "manageProducts",
};

const ORDERS: Permissions = Permissions {
    read: "getOrders",
    manage: "manageOrders",
};

const USERS: Permissions = Permissions {
    read: "getUsers",
    manage: "manageUsers",
};

/// Build the application router, loading the JWT key from configuration
pub fn build_router(state: AppState) -> Result<Router> {
    let auth = JwtAuth::new(&state.config().jwt)?;
    Ok(router(state, auth))
}

/// Build the application router around an existing authenticator
pub fn router(state: AppState, auth: JwtAuth) -> Router {
    let policy = state.policy().clone();

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::readiness))
        .merge(resource_routes::<Product>("/v1/product", PRODUCTS, &policy))
        .merge(resource_routes::<Order>("/v1/order", ORDERS, &policy))
        .route(
            "/v1/order/{id}/products",
            guarded(get(handlers::order_products), ORDERS.read, &policy),
        )
        .merge(resource_routes::<User>("/v1/users", USERS, &policy))
        .layer(from_fn_with_state(auth, JwtAuth::middleware))
        .with_state(state)
}

fn resource_routes<R: Resource>(
    base: &str,
    permissions: Permissions,
    policy: &Arc<RolePolicy>,
) -> Router<AppState> {
    let collection = guarded(post(handlers::create::<R>), permissions.manage, policy)
        .merge(guarded(get(handlers::list::<R>), permissions.read, policy));

    let item = guarded(get(handlers::get::<R>), permissions.read, policy)
        .merge(guarded(patch(handlers::update::<R>), permissions.manage, policy))
        .merge(guarded(
            axum::routing::delete(handlers::remove::<R>),
            permissions.manage,
            policy,
        ));

    Router::new()
        .route(base, collection)
        .route(&format!("{}/{{id}}", base), item)
}

fn guarded(
    route: MethodRouter<AppState>,
    permission: &'static str,
    policy: &Arc<RolePolicy>,
) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(
        RequirePermission::new(permission, policy.clone()),
        RequirePermission::middleware,
    ))
}
