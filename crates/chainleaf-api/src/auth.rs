//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | Body: [`NewUser`]; returns 201 + session |
//! | `POST` | `/auth/login` | Body: `{"email":"...","password":"..."}` |
//! | `POST` | `/auth/logout` | 204; idempotent |
//! | `GET`  | `/auth/session` | Session or `null` |
//! | `PUT`  | `/auth/profile` | Body: [`ProfileUpdate`] |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chainleaf_core::{
  store::TraceStore,
  user::{NewUser, ProfileUpdate, Session},
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// `POST /auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TraceStore,
{
  let session = state.store.register(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(session)))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<Session>, ApiError>
where
  S: TraceStore,
{
  let session = state
    .store
    .login(body.email, body.password)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(session))
}

/// `POST /auth/logout`
pub async fn logout<S>(State(state): State<AppState<S>>) -> Result<StatusCode, ApiError>
where
  S: TraceStore,
{
  state.store.logout().await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/session`
pub async fn session<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Option<Session>>, ApiError>
where
  S: TraceStore,
{
  let session = state.store.active_session().await.map_err(ApiError::from_store)?;
  Ok(Json(session))
}

/// `PUT /auth/profile`
pub async fn update_profile<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<ProfileUpdate>,
) -> Result<Json<Session>, ApiError>
where
  S: TraceStore,
{
  let session = state.store.update_profile(body).await.map_err(ApiError::from_store)?;
  Ok(Json(session))
}
