use std::time::Duration;

use axum::{
  Router,
  http::StatusCode,
  middleware,
  routing::{get, post},
};
use libmarquee::prelude::*;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{api::config::Config, api::sessions::SessionRegistry, trace::build_prometheus};

pub mod config;
pub mod dto;
pub mod errors;
pub mod sessions;

pub mod handlers;
mod middlewares;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AppState<C: CatalogProvider, S: CounterStore> {
  pub config: Config,
  pub prometheus: Option<PrometheusHandle>,
  pub marquee: Marquee<C, S>,
  pub sessions: SessionRegistry<C, S>,
}

impl<C: CatalogProvider, S: CounterStore> AppState<C, S> {
  pub fn new(config: Config, marquee: Marquee<C, S>, prometheus: Option<PrometheusHandle>) -> AppState<C, S> {
    AppState {
      sessions: SessionRegistry::new(config.session_idle_timeout),
      config,
      prometheus,
      marquee,
    }
  }
}

pub fn routes<C: CatalogProvider, S: CounterStore>(config: &Config, catalog: C, store: S) -> anyhow::Result<Router> {
  let marquee = Marquee::new(catalog, store).config(config.marquee_config()).build();

  let prometheus = match config.enable_prometheus {
    true => Some(build_prometheus()?),
    false => None,
  };

  let state = AppState::new(config.clone(), marquee, prometheus);

  state.sessions.spawn_sweeper();

  Ok(router(state))
}

pub fn router<C: CatalogProvider, S: CounterStore>(state: AppState<C, S>) -> Router {
  Router::new()
    .route("/search", get(handlers::search::<C, S>))
    .route("/trending", get(handlers::trending::<C, S>))
    .route("/sessions", post(handlers::create_session::<C, S>))
    .route("/sessions/{id}", get(handlers::get_session::<C, S>).delete(handlers::close_session::<C, S>))
    .route("/sessions/{id}/input", post(handlers::session_input::<C, S>))
    .route("/sessions/{id}/flush", post(handlers::flush_session::<C, S>))
    .fallback(handlers::not_found)
    .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, REQUEST_TIMEOUT))
    .layer(middleware::from_fn(middlewares::metrics))
    .layer(TraceLayer::new_for_http().make_span_with(middlewares::create_request_span))
    // The routes below will not go through the observability middlewares above
    .route("/healthz", get(handlers::healthz))
    .route("/readyz", get(handlers::readyz::<C, S>))
    .route("/metrics", get(handlers::prometheus::<C, S>))
    .layer(middleware::from_fn(middlewares::logging::api_logger))
    .layer(middleware::from_fn(middlewares::request_id))
    .with_state(state)
}
