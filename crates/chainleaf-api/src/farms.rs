//! Handlers for `/farms` endpoints.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chainleaf_core::{
  farm::{Farm, FarmQuery, NewFarm},
  store::TraceStore,
};

use serde::Deserialize;

use crate::{AppState, error::ApiError, session::SignedIn};

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// Case-insensitive match on name, location or owner.
  pub q: Option<String>,
}

/// `GET /farms[?q=...]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Farm>>, ApiError>
where
  S: TraceStore,
{
  let query = FarmQuery { text: params.q };
  let farms = if query.is_empty() {
    state.store.list_farms().await
  } else {
    state.store.search_farms(query).await
  }
  .map_err(ApiError::from_store)?;
  Ok(Json(farms))
}

/// `GET /farms/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Farm>, ApiError>
where
  S: TraceStore,
{
  let farm = state.store.get_farm(id).await.map_err(ApiError::from_store)?;
  Ok(Json(farm))
}

/// `POST /farms`: returns 201 + the stored farm with its assigned id.
pub async fn create<S>(
  SignedIn(session): SignedIn,
  State(state): State<AppState<S>>,
  Json(body): Json<NewFarm>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TraceStore + Clone + 'static,
{
  let farm = state.store.add_farm(body).await.map_err(ApiError::from_store)?;
  tracing::debug!(farm_id = %farm.id, by = %session.email, "farm added via api");
  Ok((StatusCode::CREATED, Json(farm)))
}
