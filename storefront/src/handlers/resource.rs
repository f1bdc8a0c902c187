//! Generic CRUD handlers

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, Query, Request, State},
    http::{HeaderName, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::ids::ResourceId;
use crate::middleware::SelfAccess;
use crate::models::Resource;
use crate::query::QueryOptions;
use crate::repository::Repository;
use crate::state::AppState;

/// Header carrying the unpaginated match count of a list request
pub const TOTAL_COUNT_HEADER: HeaderName = HeaderName::from_static("x-total-count");

/// JSON request body whose rejections are reported as 400
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(Error::BadRequest(rejection_message(&rejection))),
        }
    }
}

fn rejection_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Expected request with `Content-Type: application/json`".to_string()
        }
        other => other.body_text(),
    }
}

/// `POST /v1/<resource>`
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    JsonBody(data): JsonBody<R::Create>,
) -> Result<impl IntoResponse> {
    let entity = state.repository::<R>().create(data).await?;
    Ok((StatusCode::CREATED, Json(entity.view())))
}

/// `GET /v1/<resource>`
///
/// Only the resource's allow-listed fields filter; other keys are ignored.
pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse> {
    let options = QueryOptions::from_params(&params, R::FILTERABLE);
    let repository = state.repository::<R>();

    let entities = repository.list(&options).await?;
    let total = repository.count(&options).await?;

    let views: Vec<R::View> = entities.iter().map(R::view).collect();
    Ok(([(TOTAL_COUNT_HEADER, total.to_string())], Json(views)))
}

/// `GET /v1/<resource>/{id}`
pub async fn get<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<R::View>> {
    let id = ResourceId::parse(&id, R::ENTITY)?;
    let entity = state.repository::<R>().get(&id).await?;
    Ok(Json(entity.view()))
}

/// `PATCH /v1/<resource>/{id}`
///
/// A caller admitted only through self access may not make privileged changes.
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    self_access: Option<Extension<SelfAccess>>,
    JsonBody(data): JsonBody<R::Update>,
) -> Result<Json<R::View>> {
    if self_access.is_some() && R::privileged_update(&data) {
        tracing::warn!(entity = R::ENTITY, id = %id, "Privileged self update refused");
        return Err(Error::Forbidden("Forbidden".to_string()));
    }
    let id = ResourceId::parse(&id, R::ENTITY)?;
    let entity = state.repository::<R>().update(&id, data).await?;
    Ok(Json(entity.view()))
}

/// `DELETE /v1/<resource>/{id}`
pub async fn remove<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = ResourceId::parse(&id, R::ENTITY)?;
    state.repository::<R>().remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
