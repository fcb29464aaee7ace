//! Handlers for `/ledger` endpoints.

use axum::{
  Json,
  extract::{Path, State},
};
use chainleaf_core::{
  ledger::{Authenticity, LedgerEntry},
  store::TraceStore,
};

use crate::{AppState, error::ApiError};

/// `GET /ledger/{batch_id}`: empty list for unknown batches.
pub async fn history<S>(
  State(state): State<AppState<S>>,
  Path(batch_id): Path<String>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError>
where
  S: TraceStore,
{
  let entries = state.store.history(batch_id).await.map_err(ApiError::from_store)?;
  Ok(Json(entries))
}

/// `GET /ledger/{batch_id}/authenticity`
pub async fn authenticity<S>(
  State(state): State<AppState<S>>,
  Path(batch_id): Path<String>,
) -> Result<Json<Authenticity>, ApiError>
where
  S: TraceStore,
{
  let verdict = state
    .store
    .verify_authenticity(batch_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(verdict))
}
