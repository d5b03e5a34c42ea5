use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::{Query, WithRejection};
use libmarquee::prelude::*;
use tracing::instrument;
use validator::Validate;

use crate::api::{
  AppState,
  dto::{TrendingParams, TrendingResponse},
  errors::AppError,
  middlewares::auth::Auth,
};

#[instrument(skip_all)]
pub async fn trending<C: CatalogProvider, S: CounterStore>(
  State(state): State<AppState<C, S>>,
  _: Auth<C, S>,
  WithRejection(Query(params), _): WithRejection<Query<TrendingParams>, AppError>,
) -> Result<impl IntoResponse, AppError> {
  params.validate()?;

  let limit = params.limit.unwrap_or(state.config.trending_limit);
  let results = state.marquee.trending(limit).await?;

  Ok(Json(TrendingResponse { limit, results }))
}
