pub mod mock;
pub mod tmdb;

use std::fmt::Display;

use crate::{error::MarqueeError, model::Item};

/// A source of movie listings.
#[allow(async_fn_in_trait)]
pub trait CatalogProvider: Clone + Send + Sync + 'static {
  fn health(&self) -> impl Future<Output = Result<bool, MarqueeError>> + Send;
  fn search(&self, term: &str) -> impl Future<Output = Result<Vec<Item>, MarqueeError>> + Send;
  fn discover(&self) -> impl Future<Output = Result<Vec<Item>, MarqueeError>> + Send;
}

/// Which catalog listing a query is served from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Endpoint {
  Search,
  Discover,
}

impl Endpoint {
  /// An empty query means "no filter" and falls back to the popularity listing.
  pub fn for_query(query: &str) -> Endpoint {
    match query.is_empty() {
      true => Endpoint::Discover,
      false => Endpoint::Search,
    }
  }

  pub(crate) async fn fetch<C: CatalogProvider>(self, catalog: &C, query: &str) -> Result<Vec<Item>, MarqueeError> {
    match self {
      Endpoint::Search => catalog.search(query).await,
      Endpoint::Discover => catalog.discover().await,
    }
  }
}

impl Display for Endpoint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{}",
      match self {
        Endpoint::Search => "search",
        Endpoint::Discover => "discover",
      }
    )
  }
}

#[cfg(test)]
mod tests {
  use super::Endpoint;

  #[test]
  fn endpoint_selection() {
    assert_eq!(Endpoint::for_query(""), Endpoint::Discover);
    assert_eq!(Endpoint::for_query("Dune"), Endpoint::Search);
    assert_eq!(Endpoint::for_query(" "), Endpoint::Search);
    assert_eq!(Endpoint::Discover.to_string(), "discover");
  }
}
