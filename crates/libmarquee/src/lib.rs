mod debounce;
mod error;
mod executor;
mod marquee;
mod model;
mod session;
mod trending;

pub mod catalog;
pub mod store;

pub mod prelude {
  pub use crate::catalog::{
    CatalogProvider, Endpoint,
    mock::{MockedCall, MockedCatalog, MockedReply},
    tmdb::{TMDB_API_URL, TmdbCatalog},
  };
  pub use crate::debounce::{DEFAULT_DEBOUNCE, Debouncer};
  pub use crate::error::MarqueeError;
  pub use crate::executor::{DEFAULT_CATALOG_TIMEOUT, QueryExecutor, Resolution, SearchState};
  pub use crate::marquee::{Marquee, MarqueeConfig};
  pub use crate::model::{GENERIC_FAILURE_MESSAGE, Item, OutcomeSnapshot, SearchOutcome, SearchRequest, SearchResult, TrendingRecord, normalize_term, rank};
  pub use crate::session::Session;
  pub use crate::store::{
    CounterStore,
    elastic::{ElasticsearchStore, EsAuthMethod},
    memory::MemoryStore,
  };
  pub use crate::trending::{DEFAULT_STORE_TIMEOUT, TrendingAggregator};
}
