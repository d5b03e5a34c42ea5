use std::{borrow::Cow, error::Error};

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use libmarquee::prelude::*;
use serde_json::json;
use tracing::*;
use validator::ValidationErrors;

pub(super) struct ApiError(pub StatusCode, pub String, pub Option<Vec<String>>);

#[derive(Debug, thiserror::Error)]
#[allow(dead_code)]
pub enum AppError {
  #[error("bad request")]
  BadRequest,
  #[error("invalid credentials")]
  InvalidCredentials,
  #[error("missing resource")]
  ResourceNotFound,
  #[error("server error, please check your logs for more information")]
  ServerError,
  #[error(transparent)]
  OtherError(#[from] anyhow::Error),

  #[error("invalid configuration: {0}")]
  ConfigError(String),
  #[error("error from trending store: {0}")]
  StoreError(String),

  #[error("invalid query parameter")]
  InvalidQuery(#[from] axum_extra::extract::QueryRejection),
  #[error("invalid request parameters")]
  ValidationFailed(#[from] ValidationErrors),
}

impl From<MarqueeError> for AppError {
  fn from(value: MarqueeError) -> Self {
    match value {
      MarqueeError::ConfigError(err) => AppError::ConfigError(err),
      MarqueeError::StoreError(err) => AppError::StoreError(err),
      MarqueeError::ResourceNotFound => AppError::ResourceNotFound,
      MarqueeError::OtherError(err) => AppError::OtherError(err),
      err @ (MarqueeError::TransportError(_) | MarqueeError::ApplicationError(_) | MarqueeError::ParseError(_)) => AppError::OtherError(err.into()),
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    match ApiError::from(&self) {
      ApiError(status, ..) if status.is_server_error() => error!(error = self.source(), "{}", self.to_string()),
      _ => debug!(error = self.source(), "{}", self.to_string()),
    }

    ApiError::from(&self).into_response()
  }
}

impl From<&AppError> for ApiError {
  fn from(value: &AppError) -> Self {
    match value {
      AppError::BadRequest => ApiError(StatusCode::BAD_REQUEST, value.to_string(), None),
      AppError::InvalidCredentials => ApiError(StatusCode::UNAUTHORIZED, value.to_string(), None),
      AppError::ResourceNotFound => ApiError(StatusCode::NOT_FOUND, value.to_string(), None),
      AppError::StoreError(_) => ApiError(StatusCode::SERVICE_UNAVAILABLE, value.to_string(), None),
      AppError::InvalidQuery(err) => ApiError(StatusCode::BAD_REQUEST, value.to_string(), Some(vec![err.to_string()])),
      AppError::ValidationFailed(errs) => ApiError(StatusCode::BAD_REQUEST, value.to_string(), Some(validation_messages(errs))),
      AppError::OtherError(inner) if inner.is::<AppError>() => match inner.downcast_ref::<AppError>() {
        Some(inner) => inner.into(),
        _ => ApiError(StatusCode::INTERNAL_SERVER_ERROR, value.to_string(), None),
      },
      _ => ApiError(StatusCode::INTERNAL_SERVER_ERROR, value.to_string(), None),
    }
  }
}

pub(super) fn validation_messages(errs: &ValidationErrors) -> Vec<String> {
  errs.field_errors().into_iter().flat_map(|(_, f)| f.clone()).filter_map(|f| f.message.map(Cow::into_owned)).collect()
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let payload = match self.2 {
      Some(details) => json!({
          "message": self.1.to_string(),
          "details": details,
      }),
      None => json!({
          "message": self.1.to_string(),
      }),
    };

    (self.0, Json(payload)).into_response()
  }
}
