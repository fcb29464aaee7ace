//! JSON REST API for ChainLeaf.
//!
//! Exposes an axum [`Router`] backed by any [`TraceStore`]. TLS and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", chainleaf_api::api_router(state))
//! ```

pub mod auth;
pub mod batches;
pub mod error;
pub mod farms;
pub mod ledger;
pub mod session;
pub mod verify;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use chainleaf_core::store::TraceStore;

pub use error::ApiError;

/// Shared state threaded through all handlers.
#[derive(Clone)]
pub struct AppState<S: TraceStore> {
  pub store:  Arc<S>,
  /// Public origin used to build verification URLs, e.g.
  /// `https://chainleaf.example`.
  pub origin: Arc<str>,
}

impl<S: TraceStore> AppState<S> {
  pub fn new(store: S, origin: impl Into<Arc<str>>) -> Self {
    Self { store: Arc::new(store), origin: origin.into() }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: TraceStore + Clone + 'static,
{
  Router::new()
    // Credentials
    .route("/auth/register", post(auth::register::<S>))
    .route("/auth/login", post(auth::login::<S>))
    .route("/auth/logout", post(auth::logout::<S>))
    .route("/auth/session", get(auth::session::<S>))
    .route("/auth/profile", put(auth::update_profile::<S>))
    // Farms
    .route("/farms", get(farms::list::<S>).post(farms::create::<S>))
    .route("/farms/{id}", get(farms::get_one::<S>))
    // Batches
    .route("/batches", get(batches::list::<S>).post(batches::create::<S>))
    .route("/batches/summary", get(batches::summary::<S>))
    .route("/batches/{id}", get(batches::get_one::<S>))
    .route("/batches/{id}/status", post(batches::update_status::<S>))
    .route("/batches/{id}/qr", get(batches::qr::<S>))
    // Ledger
    .route("/ledger/{batch_id}", get(ledger::history::<S>))
    .route("/ledger/{batch_id}/authenticity", get(ledger::authenticity::<S>))
    // Verification
    .route("/verify/{batch_id}", get(verify::report::<S>))
    .route("/scan", post(verify::scan))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use chainleaf_core::{batch::Batch, ledger::LedgerEntry, user::Session};
  use chainleaf_store_sqlite::{SqliteStore, seed};
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use crate::{batches::QrPayload, verify::VerificationReport};

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.seed_if_empty(seed::demo_data().unwrap()).await.unwrap();
    AppState::new(store, "http://localhost:8080")
  }

  async fn send(
    state: AppState<SqliteStore>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = api_router(state).oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn login_admin(state: &AppState<SqliteStore>) {
    let (status, _) = send(
      state.clone(),
      "POST",
      "/auth/login",
      Some(json!({ "email": "admin@chainleaf.com", "password": "1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
  }

  fn new_batch() -> Value {
    json!({
      "farmId": "FARM-001",
      "harvestDate": "2023-08-15",
      "variety": "Virginia Gold",
      "quantity": "5000 kg",
      "grade": "Premium",
    })
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_login_logout_flow() {
    let state = make_state().await;
    let (status, body) = send(
      state.clone(),
      "POST",
      "/auth/register",
      Some(json!({
        "name": "Dana", "email": "dana@farm.test", "password": "pw", "role": "consumer"
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let session: Session = serde_json::from_value(body).unwrap();
    assert_eq!(session.email, "dana@farm.test");

    let (_, current) = send(state.clone(), "GET", "/auth/session", None).await;
    assert_eq!(current["email"], "dana@farm.test");
    assert!(current.get("password").is_none());

    for _ in 0..2 {
      let (status, _) = send(state.clone(), "POST", "/auth/logout", None).await;
      assert_eq!(status, StatusCode::NO_CONTENT);
    }
    let (_, current) = send(state, "GET", "/auth/session", None).await;
    assert!(current.is_null());
  }

  #[tokio::test]
  async fn duplicate_registration_is_409() {
    let state = make_state().await;
    let (status, body) = send(
      state,
      "POST",
      "/auth/register",
      Some(json!({
        "name": "X", "email": "admin@chainleaf.com", "password": "pw", "role": "admin"
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already registered"));
  }

  #[tokio::test]
  async fn bad_login_is_401() {
    let state = make_state().await;
    let (status, _) = send(
      state,
      "POST",
      "/auth/login",
      Some(json!({ "email": "admin@chainleaf.com", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn profile_update_from_form_renames_user() {
    let state = make_state().await;
    login_admin(&state).await;

    let (status, body) = send(
      state.clone(),
      "PUT",
      "/auth/profile",
      Some(json!({
        "name": "Head Admin",
        "email": "admin@chainleaf.com",
        "currentPassword": "",
        "newPassword": "",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Head Admin");

    let (_, current) = send(state.clone(), "GET", "/auth/session", None).await;
    assert_eq!(current["name"], "Head Admin");

    send(state.clone(), "POST", "/auth/logout", None).await;
    login_admin(&state).await;
  }

  #[tokio::test]
  async fn profile_update_without_session_is_401() {
    let state = make_state().await;
    let (status, _) = send(
      state,
      "PUT",
      "/auth/profile",
      Some(json!({ "name": "A", "email": "a@b.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  // ── Batches ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn creating_a_batch_requires_a_session() {
    let state = make_state().await;
    let (status, _) = send(state, "POST", "/batches", Some(new_batch())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn create_update_and_read_history() {
    let state = make_state().await;
    login_admin(&state).await;

    let (status, body) = send(state.clone(), "POST", "/batches", Some(new_batch())).await;
    assert_eq!(status, StatusCode::CREATED);
    let batch: Batch = serde_json::from_value(body).unwrap();
    assert_eq!(batch.status.as_ref(), "harvested");

    let (status, body) = send(
      state.clone(),
      "POST",
      &format!("/batches/{}/status", batch.id),
      Some(json!({ "status": "processing", "location": "Central Facility" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "processing");
    assert_eq!(body["lastLocation"], "Central Facility");

    let (_, body) = send(state.clone(), "GET", &format!("/ledger/{}", batch.id), None).await;
    let history: Vec<LedgerEntry> = serde_json::from_value(body).unwrap();
    assert_eq!(history.len(), 2);

    let (_, body) =
      send(state, "GET", &format!("/ledger/{}/authenticity", batch.id), None).await;
    assert_eq!(body["authentic"], true);
    assert_eq!(body["chainValid"], true);
  }

  #[tokio::test]
  async fn unknown_status_is_400() {
    let state = make_state().await;
    login_admin(&state).await;
    let (status, body) = send(
      state,
      "POST",
      "/batches/BATCH-001/status",
      Some(json!({ "status": "lost", "location": "Nowhere" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("lost"));
  }

  #[tokio::test]
  async fn missing_batch_is_404() {
    let state = make_state().await;
    let (status, _) = send(state.clone(), "GET", "/batches/BATCH-404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(state, "GET", "/ledger/BATCH-404", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
  }

  #[tokio::test]
  async fn summary_lists_every_status() {
    let state = make_state().await;
    let (status, body) = send(state, "GET", "/batches/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 7);
    assert_eq!(body[0]["status"], "harvested");
    assert_eq!(body[0]["count"], 1);
    assert_eq!(body[0]["label"], "Harvested");
    assert_eq!(body[6]["description"], "Product has been recalled");
  }

  #[tokio::test]
  async fn batch_list_accepts_filters() {
    let state = make_state().await;
    let ids = |body: Value| -> Vec<String> {
      body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap().to_owned())
        .collect()
    };

    let (_, body) = send(state.clone(), "GET", "/batches?q=BURLEY", None).await;
    assert_eq!(ids(body), ["BATCH-002"]);

    let (_, body) = send(state.clone(), "GET", "/batches?status=retail", None).await;
    assert_eq!(ids(body), ["BATCH-004"]);

    let (_, body) =
      send(state.clone(), "GET", "/batches?farmId=FARM-001&status=harvested", None).await;
    assert_eq!(ids(body), ["BATCH-001"]);

    let (_, body) = send(state.clone(), "GET", "/batches?q=&status=&farmId=", None).await;
    assert_eq!(ids(body).len(), 4);

    let (status, _) = send(state, "GET", "/batches?status=lost", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── QR / verification ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn qr_url_scans_back_to_batch() {
    let state = make_state().await;
    let (_, body) = send(state.clone(), "GET", "/batches/BATCH-002/qr", None).await;
    let qr: QrPayload = serde_json::from_value(body).unwrap();
    assert_eq!(qr.url, "http://localhost:8080/verify/BATCH-002");

    let (status, body) =
      send(state.clone(), "POST", "/scan", Some(json!({ "payload": qr.url }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "batchId": "BATCH-002" }));

    let (_, body) =
      send(state, "POST", "/scan", Some(json!({ "payload": "not a url" }))).await;
    assert_eq!(body["success"], false);
  }

  #[tokio::test]
  async fn verification_report_combines_farm_and_history() {
    let state = make_state().await;
    let (status, body) = send(state.clone(), "GET", "/verify/BATCH-002", None).await;
    assert_eq!(status, StatusCode::OK);
    let report: VerificationReport = serde_json::from_value(body).unwrap();
    assert_eq!(report.farm.unwrap().name, "Green Valley Tobacco");
    assert_eq!(report.history.len(), 2);
    assert!(report.authenticity.authentic);

    let (_, body) = send(state, "GET", "/verify/BATCH-004", None).await;
    assert_eq!(body["authenticity"]["authentic"], false);
  }

  // ── Farms ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn add_farm_gets_sequential_id() {
    let state = make_state().await;
    login_admin(&state).await;
    let (status, body) = send(
      state.clone(),
      "POST",
      "/farms",
      Some(json!({
        "name": "Blue Ridge Leaf",
        "location": "Tennessee, USA",
        "owner": "Sam Okafor",
        "certifications": ["Organic"],
        "established": "2015-04-01",
        "size": "90 acres",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "FARM-004");

    let (status, _) = send(state, "GET", "/farms/FARM-004", None).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn farm_lookup_and_search() {
    let state = make_state().await;
    let (status, body) = send(state.clone(), "GET", "/farms/FARM-404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("FARM-404"));

    let (status, body) = send(state.clone(), "GET", "/farms?q=rodriguez", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], "FARM-002");

    let (_, body) = send(state, "GET", "/farms", None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
  }
}
