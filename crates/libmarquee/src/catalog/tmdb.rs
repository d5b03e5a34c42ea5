use std::time::Duration;

use reqwest::{
  Client, StatusCode,
  header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use tracing::instrument;

use crate::{catalog::CatalogProvider, error::MarqueeError, model::Item};

pub const TMDB_API_URL: &str = "https://api.themoviedb.org/3";

/// Catalog backed by The Movie Database HTTP API.
///
/// Both listings share the same request shape: a `GET` with a JSON `accept`
/// header and a bearer credential, differing only in path and parameters.
#[derive(Clone, Debug)]
pub struct TmdbCatalog {
  client: Client,
  base_url: String,
}

#[derive(Deserialize)]
struct TmdbListing {
  #[serde(default)]
  results: Option<Vec<Item>>,

  // Failure payloads come in two flavors depending on the upstream.
  #[serde(default)]
  success: Option<bool>,
  #[serde(default)]
  status_message: Option<String>,
  #[serde(rename = "Response", default)]
  response: Option<String>,
  #[serde(rename = "Error", default)]
  error: Option<String>,
}

impl TmdbCatalog {
  pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<TmdbCatalog, MarqueeError> {
    let mut headers = HeaderMap::new();
    let mut authorization = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| MarqueeError::ConfigError("catalog token contains invalid characters".into()))?;

    authorization.set_sensitive(true);

    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(AUTHORIZATION, authorization);

    let client = Client::builder()
      .default_headers(headers)
      .timeout(timeout)
      .build()
      .map_err(|err| MarqueeError::ConfigError(format!("could not build catalog client: {err}")))?;

    Ok(TmdbCatalog {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
    })
  }

  async fn listing(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<Item>, MarqueeError> {
    let response = self.client.get(format!("{}/{path}", self.base_url)).query(params).send().await?;
    let status = response.status();

    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();

      tracing::error!(status = status.as_u16(), %body, "catalog returned an error status");

      return Err(MarqueeError::TransportError(format!("HTTP error, status: {}", status.as_u16())));
    }

    parse_listing(&response.bytes().await?)
  }
}

pub(crate) fn parse_listing(body: &[u8]) -> Result<Vec<Item>, MarqueeError> {
  let listing: TmdbListing = serde_json::from_slice(body).map_err(|err| MarqueeError::ParseError(err.to_string()))?;

  if listing.success == Some(false) {
    return Err(MarqueeError::ApplicationError(listing.status_message));
  }

  if listing.response.as_deref() == Some("False") {
    return Err(MarqueeError::ApplicationError(listing.error));
  }

  Ok(listing.results.unwrap_or_default())
}

impl CatalogProvider for TmdbCatalog {
  #[instrument(skip_all)]
  async fn health(&self) -> Result<bool, MarqueeError> {
    match self.client.get(format!("{}/configuration", self.base_url)).send().await {
      Ok(response) => Ok(response.status() == StatusCode::OK),
      Err(err) => {
        tracing::warn!(error = %err, "catalog is unreachable");

        Ok(false)
      }
    }
  }

  #[instrument(skip_all)]
  async fn search(&self, term: &str) -> Result<Vec<Item>, MarqueeError> {
    self.listing("search/movie", &[("query", term)]).await
  }

  #[instrument(skip_all)]
  async fn discover(&self) -> Result<Vec<Item>, MarqueeError> {
    self.listing("discover/movie", &[("sort_by", "popularity.desc")]).await
  }
}
