use std::{
  env::{self, VarError},
  fmt::Display,
  str::FromStr,
  time::Duration,
};

use libmarquee::prelude::*;

use crate::api::errors::AppError;

#[derive(Clone, Debug)]
pub struct Config {
  pub env: Env,
  pub listen_addr: String,
  pub api_key: Option<String>,

  // Catalog
  pub catalog_url: String,
  pub catalog_token: String,
  pub catalog_timeout: Duration,

  // Trending store
  pub store_backend: StoreBackend,
  pub store_timeout: Duration,
  pub index_url: String,
  pub index_name: String,
  pub index_auth_method: IndexAuthMethod,
  pub index_client_id: Option<String>,
  pub index_client_secret: Option<String>,

  // Search settings
  pub debounce: Duration,
  pub cancel_superseded: bool,
  pub trending_limit: usize,
  pub session_idle_timeout: Duration,

  // Debugging
  pub enable_tracing: bool,
  pub tracing_exporter: TracingExporter,
  pub enable_prometheus: bool,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      env: Env::Dev,
      listen_addr: "0.0.0.0:8000".into(),
      api_key: None,
      catalog_url: TMDB_API_URL.into(),
      catalog_token: String::new(),
      catalog_timeout: DEFAULT_CATALOG_TIMEOUT,
      store_backend: StoreBackend::Memory,
      store_timeout: DEFAULT_STORE_TIMEOUT,
      index_url: "http://localhost:9200".into(),
      index_name: "marquee-trending".into(),
      index_auth_method: IndexAuthMethod::None,
      index_client_id: None,
      index_client_secret: None,
      debounce: DEFAULT_DEBOUNCE,
      cancel_superseded: true,
      trending_limit: 5,
      session_idle_timeout: Duration::from_secs(15 * 60),
      enable_tracing: false,
      tracing_exporter: TracingExporter::Otlp,
      enable_prometheus: false,
    }
  }
}

impl Config {
  pub fn from_env() -> Result<Config, AppError> {
    let config = Config {
      env: Env::from(env::var("ENV").unwrap_or("dev".into())),
      listen_addr: env::var("LISTEN_ADDR").unwrap_or("0.0.0.0:8000".into()),
      api_key: env::var("API_KEY").ok().filter(|key| !key.is_empty()),
      catalog_url: env::var("CATALOG_URL").unwrap_or(TMDB_API_URL.into()),
      catalog_token: env::var("CATALOG_TOKEN").map_err(|_| AppError::ConfigError("CATALOG_TOKEN is required".into()))?,
      catalog_timeout: Duration::from_millis(parse_env("CATALOG_TIMEOUT_MS", 10_000)?),
      store_backend: env::var("STORE_BACKEND").unwrap_or("memory".into()).parse()?,
      store_timeout: Duration::from_millis(parse_env("STORE_TIMEOUT_MS", 5_000)?),
      index_url: env::var("INDEX_URL").unwrap_or("http://localhost:9200".into()),
      index_name: env::var("INDEX_NAME").unwrap_or("marquee-trending".into()),
      index_auth_method: env::var("INDEX_AUTH_METHOD").unwrap_or("none".into()).parse()?,
      index_client_id: env::var("INDEX_CLIENT_ID").map(Some).unwrap_or_default(),
      index_client_secret: env::var("INDEX_CLIENT_SECRET").map(Some).unwrap_or_default(),
      debounce: Duration::from_millis(parse_env("DEBOUNCE_MS", 500)?),
      cancel_superseded: parse_env("CANCEL_SUPERSEDED", true)?,
      trending_limit: parse_env("TRENDING_LIMIT", 5)?,
      session_idle_timeout: Duration::from_secs(parse_env("SESSION_IDLE_TIMEOUT_SECS", 15 * 60)?),
      enable_tracing: env::var("ENABLE_TRACING").unwrap_or_default() == "1",
      tracing_exporter: env::var("TRACING_EXPORTER").unwrap_or("otlp".into()).parse()?,
      enable_prometheus: env::var("ENABLE_PROMETHEUS").unwrap_or_default() == "1",
    };

    if config.catalog_token.trim().is_empty() {
      return Err(AppError::ConfigError("CATALOG_TOKEN cannot be empty".into()));
    }

    if !(1..=100).contains(&config.trending_limit) {
      return Err(AppError::ConfigError("TRENDING_LIMIT must be between 1 and 100".into()));
    }

    for (name, value) in [
      ("CATALOG_TIMEOUT_MS", config.catalog_timeout),
      ("STORE_TIMEOUT_MS", config.store_timeout),
      ("SESSION_IDLE_TIMEOUT_SECS", config.session_idle_timeout),
    ] {
      if value.is_zero() {
        return Err(AppError::ConfigError(format!("{name} must be greater than zero")));
      }
    }

    // Only checked when the index is actually used.
    if config.store_backend == StoreBackend::Elasticsearch {
      config.es_auth_method()?;
    }

    Ok(config)
  }

  pub fn marquee_config(&self) -> MarqueeConfig {
    MarqueeConfig {
      debounce: self.debounce,
      catalog_timeout: self.catalog_timeout,
      store_timeout: self.store_timeout,
      cancel_superseded: self.cancel_superseded,
    }
  }

  pub fn es_auth_method(&self) -> Result<EsAuthMethod, AppError> {
    let id = self.index_client_id.clone();
    let secret = self.index_client_secret.clone();

    match (&self.index_auth_method, id, secret) {
      (IndexAuthMethod::None, _, _) => Ok(EsAuthMethod::None),
      (IndexAuthMethod::Basic, Some(id), Some(secret)) => Ok(EsAuthMethod::Basic(id, secret)),
      (IndexAuthMethod::ApiKey, Some(id), Some(secret)) => Ok(EsAuthMethod::ApiKey(id, secret)),
      (IndexAuthMethod::Bearer, _, Some(secret)) => Ok(EsAuthMethod::Bearer(secret)),
      (IndexAuthMethod::EncodedApiKey, _, Some(secret)) => Ok(EsAuthMethod::EncodedApiKey(secret)),

      (IndexAuthMethod::Basic | IndexAuthMethod::ApiKey, _, _) => Err(AppError::ConfigError(
        "INDEX_CLIENT_ID and INDEX_CLIENT_SECRET are required when using Basic or ApiKey authentication methods".into(),
      )),
      (IndexAuthMethod::Bearer | IndexAuthMethod::EncodedApiKey, _, None) => Err(AppError::ConfigError(
        "INDEX_CLIENT_SECRET is required when using Bearer or EncodedApiKey authentication methods".into(),
      )),
    }
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Env {
  Dev,
  Production,
}

impl From<String> for Env {
  fn from(value: String) -> Self {
    match value.as_ref() {
      "dev" => Env::Dev,
      "production" => Env::Production,
      _ => Env::Dev,
    }
  }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StoreBackend {
  Memory,
  Elasticsearch,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "memory" => Ok(StoreBackend::Memory),
      "elasticsearch" => Ok(StoreBackend::Elasticsearch),
      other => Err(AppError::ConfigError(format!("unsupported store backend: {other}"))),
    }
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IndexAuthMethod {
  None,
  Basic,
  Bearer,
  ApiKey,
  EncodedApiKey,
}

impl FromStr for IndexAuthMethod {
  type Err = AppError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "none" => Ok(IndexAuthMethod::None),
      "basic" => Ok(IndexAuthMethod::Basic),
      "bearer" => Ok(IndexAuthMethod::Bearer),
      "api_key" => Ok(IndexAuthMethod::ApiKey),
      "encoded_api_key" => Ok(IndexAuthMethod::EncodedApiKey),
      _ => Err(AppError::ConfigError("invalid elasticsearch authentication method".into())),
    }
  }
}

#[derive(Clone, Debug)]
pub enum TracingExporter {
  Otlp,
}

impl FromStr for TracingExporter {
  type Err = AppError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "otlp" => Ok(TracingExporter::Otlp),
      other => Err(AppError::ConfigError(format!("unsupported tracing exporter kind: {other}"))),
    }
  }
}

pub fn parse_env<T>(name: &str, default: T) -> Result<T, AppError>
where
  T: FromStr,
  T::Err: Display,
{
  match env::var(name) {
    Ok(value) if value.is_empty() => Ok(default),
    Ok(value) => value.parse::<T>().map_err(|err| AppError::ConfigError(format!("could not read {name}: {err}"))),
    Err(err) => match err {
      VarError::NotPresent => Ok(default),
      _ => Err(AppError::ConfigError(format!("could not read {name}: {err}"))),
    },
  }
}
