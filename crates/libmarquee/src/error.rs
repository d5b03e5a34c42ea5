use crate::model::GENERIC_FAILURE_MESSAGE;

#[derive(Debug, thiserror::Error)]
pub enum MarqueeError {
  #[error("invalid configuration: {0}")]
  ConfigError(String),
  #[error("resource not found")]
  ResourceNotFound,
  #[error("could not reach catalog: {0}")]
  TransportError(String),
  #[error("catalog reported a failure: {}", .0.as_deref().unwrap_or("no details"))]
  ApplicationError(Option<String>),
  #[error("unexpected catalog response: {0}")]
  ParseError(String),
  #[error("counter store failure: {0}")]
  StoreError(String),
  #[error(transparent)]
  OtherError(#[from] anyhow::Error),
}

impl MarqueeError {
  /// Text to display for a failed search.
  ///
  /// Only a message supplied by the catalog itself is surfaced, every other
  /// cause collapses into [`GENERIC_FAILURE_MESSAGE`].
  pub fn user_message(&self) -> String {
    match self {
      MarqueeError::ApplicationError(Some(message)) if !message.trim().is_empty() => message.clone(),
      _ => GENERIC_FAILURE_MESSAGE.to_string(),
    }
  }
}

impl From<reqwest::Error> for MarqueeError {
  fn from(err: reqwest::Error) -> Self {
    match err.is_decode() {
      true => MarqueeError::ParseError(err.to_string()),
      false => MarqueeError::TransportError(err.to_string()),
    }
  }
}

impl From<elasticsearch::Error> for MarqueeError {
  fn from(err: elasticsearch::Error) -> Self {
    MarqueeError::StoreError(err.to_string())
  }
}
