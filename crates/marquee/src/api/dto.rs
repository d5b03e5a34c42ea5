use libmarquee::prelude::*;
use serde::{Deserialize, Serialize};
use serde_inline_default::serde_inline_default;
use uuid::Uuid;
use validator::Validate;

#[serde_inline_default]
#[derive(Clone, Debug, Deserialize)]
pub struct SearchParams {
  // A missing query is the same as an empty one, and lists popular movies.
  #[serde_inline_default(String::new())]
  pub query: String,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct TrendingParams {
  #[serde(default)]
  #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
  pub limit: Option<usize>,
}

#[derive(Serialize)]
pub(super) struct TrendingResponse {
  pub limit: usize,
  pub results: Vec<TrendingRecord>,
}

#[derive(Serialize)]
pub(super) struct SessionCreated {
  pub id: Uuid,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub(crate) struct InputPayload {
  #[validate(length(max = 500, message = "input value cannot be longer than 500 characters"))]
  pub value: String,
}
