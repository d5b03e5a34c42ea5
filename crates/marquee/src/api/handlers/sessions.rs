use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use libmarquee::prelude::*;
use tracing::instrument;
use uuid::Uuid;

use crate::api::{
  AppState,
  dto::{InputPayload, SessionCreated},
  errors::AppError,
  middlewares::{auth::Auth, json_rejection::TypedJson},
};

#[instrument(skip_all)]
pub async fn create_session<C: CatalogProvider, S: CounterStore>(State(state): State<AppState<C, S>>, _: Auth<C, S>) -> impl IntoResponse {
  let id = state.sessions.open(&state.marquee);

  (StatusCode::CREATED, Json(SessionCreated { id }))
}

#[instrument(skip_all, fields(session = %id))]
pub async fn get_session<C: CatalogProvider, S: CounterStore>(State(state): State<AppState<C, S>>, _: Auth<C, S>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
  let snapshot = state.sessions.with(&id, |session| session.snapshot()).ok_or(AppError::ResourceNotFound)?;

  Ok(Json(snapshot))
}

#[instrument(skip_all, fields(session = %id))]
pub async fn session_input<C: CatalogProvider, S: CounterStore>(
  State(state): State<AppState<C, S>>,
  _: Auth<C, S>,
  Path(id): Path<Uuid>,
  TypedJson(payload): TypedJson<InputPayload>,
) -> Result<StatusCode, AppError> {
  state.sessions.with(&id, |session| session.on_input(payload.value)).ok_or(AppError::ResourceNotFound)?;

  Ok(StatusCode::ACCEPTED)
}

#[instrument(skip_all, fields(session = %id))]
pub async fn flush_session<C: CatalogProvider, S: CounterStore>(State(state): State<AppState<C, S>>, _: Auth<C, S>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
  state.sessions.with(&id, |session| session.flush()).ok_or(AppError::ResourceNotFound)?;

  Ok(StatusCode::ACCEPTED)
}

#[instrument(skip_all, fields(session = %id))]
pub async fn close_session<C: CatalogProvider, S: CounterStore>(State(state): State<AppState<C, S>>, _: Auth<C, S>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
  match state.sessions.close(&id) {
    true => Ok(StatusCode::NO_CONTENT),
    false => Err(AppError::ResourceNotFound),
  }
}
