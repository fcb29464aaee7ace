//! Consumer-facing verification: the scan endpoint and the full report for a
//! batch.

use axum::{
  Json,
  extract::{Path, State},
};
use chainleaf_core::{
  DomainError as _,
  Error as CoreError,
  batch::Batch,
  farm::Farm,
  ledger::{Authenticity, LedgerEntry},
  store::TraceStore,
  verify::parse_verification_url,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

/// Everything shown to a consumer who scans a batch.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
  pub batch:        Batch,
  /// `None` when the batch references a farm that is not registered.
  pub farm:         Option<Farm>,
  pub history:      Vec<LedgerEntry>,
  pub authenticity: Authenticity,
}

/// `GET /verify/{batch_id}`
pub async fn report<S>(
  State(state): State<AppState<S>>,
  Path(batch_id): Path<String>,
) -> Result<Json<VerificationReport>, ApiError>
where
  S: TraceStore,
{
  let store = &state.store;
  let batch = store.get_batch(batch_id).await.map_err(ApiError::from_store)?;

  let farm = match store.get_farm(batch.farm_id.clone()).await {
    Ok(farm) => Some(farm),
    Err(e) if matches!(e.domain(), Some(CoreError::FarmNotFound(_))) => None,
    Err(e) => return Err(ApiError::from_store(e)),
  };
  let history = store.history(batch.id.clone()).await.map_err(ApiError::from_store)?;
  let authenticity = Authenticity::from_history(&history);

  Ok(Json(VerificationReport { batch, farm, history, authenticity }))
}

#[derive(Debug, Deserialize)]
pub struct ScanBody {
  pub payload: String,
}

/// Outcome of decoding a scanned QR payload. An unreadable payload is a
/// normal outcome, not an HTTP error.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScanResult {
  #[serde(rename_all = "camelCase")]
  Decoded { success: bool, batch_id: String },
  Rejected { success: bool, error: String },
}

impl ScanResult {
  pub fn from_payload(payload: &str) -> Self {
    match parse_verification_url(payload) {
      Ok(batch_id) => Self::Decoded { success: true, batch_id },
      Err(e) => Self::Rejected { success: false, error: e.to_string() },
    }
  }
}

/// `POST /scan`: body: `{"payload":"<scanned text>"}`
pub async fn scan(Json(body): Json<ScanBody>) -> Json<ScanResult> {
  Json(ScanResult::from_payload(&body.payload))
}
