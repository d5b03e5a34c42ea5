mod search;
mod sessions;
mod trending;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use libmarquee::prelude::*;

use crate::api::{AppState, errors::AppError};

pub(super) use self::search::search;
pub(super) use self::sessions::{close_session, create_session, flush_session, get_session, session_input};
pub(super) use self::trending::trending;

pub async fn not_found() -> impl IntoResponse {
  AppError::ResourceNotFound
}

pub async fn healthz() -> StatusCode {
  StatusCode::OK
}

pub async fn readyz<C: CatalogProvider, S: CounterStore>(State(state): State<AppState<C, S>>) -> StatusCode {
  match state.marquee.health().await {
    Ok(true) => StatusCode::OK,
    Ok(false) => StatusCode::SERVICE_UNAVAILABLE,

    Err(err) => {
      tracing::warn!(error = %err, "could not check backend health");

      StatusCode::SERVICE_UNAVAILABLE
    }
  }
}

pub async fn prometheus<C: CatalogProvider, S: CounterStore>(State(state): State<AppState<C, S>>) -> Result<String, AppError> {
  match state.prometheus {
    Some(handle) => Ok(handle.render()),
    None => Err(AppError::ResourceNotFound),
  }
}
