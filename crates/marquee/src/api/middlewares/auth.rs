use std::marker::PhantomData;

use anyhow::Context;
use axum::{
  RequestPartsExt,
  extract::{FromRef, FromRequestParts},
  http::request::Parts,
};
use axum_extra::{
  TypedHeader,
  headers::{Authorization, authorization::Bearer},
};
use libmarquee::prelude::*;

use crate::api::{AppState, errors::AppError};

/// Requires the configured API key as a bearer token, if there is one.
#[non_exhaustive]
pub(crate) struct Auth<C, S> {
  _marker: PhantomData<(C, S)>,
}

impl<St, C, S> FromRequestParts<St> for Auth<C, S>
where
  C: CatalogProvider,
  S: CounterStore,
  St: Send + Sync,
  AppState<C, S>: FromRef<St>,
{
  type Rejection = AppError;

  async fn from_request_parts(parts: &mut Parts, state: &St) -> Result<Self, Self::Rejection> {
    let app_state = AppState::<C, S>::from_ref(state);

    let Some(api_key) = app_state.config.api_key else {
      return Ok(Auth { _marker: PhantomData });
    };

    let header = parts
      .extract::<TypedHeader<Authorization<Bearer>>>()
      .await
      .context("no authorization header found")
      .context(AppError::InvalidCredentials)?;

    if header.token() != api_key {
      return Err(AppError::InvalidCredentials);
    }

    Ok(Auth::<C, S> { _marker: PhantomData })
  }
}
