use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::{Query, WithRejection};
use libmarquee::prelude::*;
use tracing::instrument;

use crate::api::{AppState, dto::SearchParams, errors::AppError, middlewares::auth::Auth};

/// One-shot search, outside of any session.
#[instrument(skip_all)]
pub async fn search<C: CatalogProvider, S: CounterStore>(
  State(state): State<AppState<C, S>>,
  _: Auth<C, S>,
  WithRejection(Query(params), _): WithRejection<Query<SearchParams>, AppError>,
) -> Result<(StatusCode, impl IntoResponse), AppError> {
  let outcome = state.marquee.search(&params.query).await;

  let status = match outcome {
    SearchOutcome::Failure { .. } => StatusCode::BAD_GATEWAY,
    _ => StatusCode::OK,
  };

  Ok((status, Json(outcome)))
}
