//! Handlers for `/batches` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/batches` | Creation order; filters: [`ListParams`] |
//! | `POST` | `/batches` | Body: [`NewBatch`]; requires a session; 201 |
//! | `GET`  | `/batches/summary` | Count per status |
//! | `GET`  | `/batches/{id}` | 404 if not found |
//! | `POST` | `/batches/{id}/status` | Body: [`StatusBody`]; requires a session |
//! | `GET`  | `/batches/{id}/qr` | Verification URL for the batch |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chainleaf_core::{
  batch::{Batch, BatchQuery, BatchStatus, NewBatch, StatusCount},
  store::TraceStore,
  verify::verification_url,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, session::SignedIn};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  /// Case-insensitive match on id, variety or grade.
  pub q:       Option<String>,
  /// Exact status name; blank means any.
  pub status:  Option<String>,
  pub farm_id: Option<String>,
}

impl ListParams {
  fn into_query(self) -> Result<BatchQuery, ApiError> {
    let status = match self.status.as_deref() {
      None | Some("") => None,
      Some(s) => Some(BatchStatus::parse(s)?),
    };
    Ok(BatchQuery { text: self.q, status, farm_id: self.farm_id })
  }
}

/// `GET /batches[?q=...][&status=...][&farmId=...]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Batch>>, ApiError>
where
  S: TraceStore,
{
  let query = params.into_query()?;
  let batches = if query.is_empty() {
    state.store.list_batches().await
  } else {
    state.store.search_batches(query).await
  }
  .map_err(ApiError::from_store)?;
  Ok(Json(batches))
}

/// `GET /batches/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Batch>, ApiError>
where
  S: TraceStore,
{
  let batch = state.store.get_batch(id).await.map_err(ApiError::from_store)?;
  Ok(Json(batch))
}

/// `POST /batches`: returns 201 + the created batch.
pub async fn create<S>(
  SignedIn(_): SignedIn,
  State(state): State<AppState<S>>,
  Json(body): Json<NewBatch>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TraceStore + Clone + 'static,
{
  let batch = state.store.create_batch(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(batch)))
}

/// JSON body accepted by `POST /batches/{id}/status`.
///
/// `status` is parsed by hand so unknown values get a domain error rather
/// than a generic deserialisation rejection.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status:   String,
  pub location: String,
}

/// `POST /batches/{id}/status`
pub async fn update_status<S>(
  SignedIn(session): SignedIn,
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Batch>, ApiError>
where
  S: TraceStore + Clone + 'static,
{
  let status = BatchStatus::parse(&body.status)?;
  if status.needs_confirmation() {
    tracing::warn!(batch_id = %id, by = %session.email, "batch recalled");
  }
  let batch = state
    .store
    .update_status(id, status, body.location)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(batch))
}

/// `GET /batches/summary`
pub async fn summary<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<StatusCount>>, ApiError>
where
  S: TraceStore,
{
  let counts = state.store.status_summary().await.map_err(ApiError::from_store)?;
  Ok(Json(counts))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
  pub batch_id: String,
  pub url:      String,
}

/// `GET /batches/{id}/qr`: the URL encoded into the batch's QR code.
pub async fn qr<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<QrPayload>, ApiError>
where
  S: TraceStore,
{
  let batch = state.store.get_batch(id).await.map_err(ApiError::from_store)?;
  let url = verification_url(&state.origin, &batch.id);
  Ok(Json(QrPayload { batch_id: batch.id, url }))
}
