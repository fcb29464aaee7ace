//! Extractor that requires an active session.

use axum::{extract::FromRequestParts, http::request::Parts};
use chainleaf_core::{store::TraceStore, user::Session};

use crate::{AppState, error::ApiError};

/// Present in a handler means someone is logged in; carries their session.
pub struct SignedIn(pub Session);

impl<S> FromRequestParts<AppState<S>> for SignedIn
where
  S: TraceStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    _parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    state
      .store
      .active_session()
      .await
      .map_err(ApiError::from_store)?
      .map(SignedIn)
      .ok_or_else(|| ApiError::Unauthorized("no user is currently logged in".to_owned()))
  }
}
