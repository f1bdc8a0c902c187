//! Order relations

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::ids::ResourceId;
use crate::models::{product, Order, ProductView, Resource};
use crate::repository::{RelationLoader, Repository};
use crate::state::AppState;

/// `GET /v1/order/{id}/products`
///
/// Products in cart order, each listed once. Items whose product has since
/// been deleted are left out.
pub async fn order_products(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ProductView>>> {
    let id = ResourceId::parse(&id, Order::ENTITY)?;
    let order = state.repository::<Order>().get(&id).await?;

    let product_ids = order.product_ids();
    let products = state.product_lookup().batch_load(&product_ids).await?;

    let views = product_ids
        .iter()
        .filter_map(|id| products.get(id))
        .map(product::transform)
        .collect();

    Ok(Json(views))
}
