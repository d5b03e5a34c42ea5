use std::time::Duration;

use bon::bon;
use tracing::instrument;

use crate::{
  catalog::CatalogProvider,
  debounce::DEFAULT_DEBOUNCE,
  error::MarqueeError,
  executor::{self, DEFAULT_CATALOG_TIMEOUT, QueryExecutor},
  model::{SearchOutcome, SearchRequest, TrendingRecord},
  session::Session,
  store::CounterStore,
  trending::{DEFAULT_STORE_TIMEOUT, TrendingAggregator},
};

#[derive(Clone, Copy, Debug)]
pub struct MarqueeConfig {
  /// Quiet period before a session's input is searched.
  pub debounce: Duration,
  pub catalog_timeout: Duration,
  pub store_timeout: Duration,
  /// Abort the catalog call of a superseded request instead of letting it finish.
  pub cancel_superseded: bool,
}

impl Default for MarqueeConfig {
  fn default() -> Self {
    MarqueeConfig {
      debounce: DEFAULT_DEBOUNCE,
      catalog_timeout: DEFAULT_CATALOG_TIMEOUT,
      store_timeout: DEFAULT_STORE_TIMEOUT,
      cancel_superseded: true,
    }
  }
}

/// The main entrypoint for using the Marquee library.
///
/// `Marquee` ties a [`CatalogProvider`], used to list and search movies, to a
/// [`CounterStore`] keeping track of the most searched terms. It can run
/// one-shot searches, or open debounced [`Session`]s that follow a user typing
/// into a search box.
///
/// # Examples
///
/// ```rust
/// # use libmarquee::prelude::*;
/// # tokio_test::block_on(async {
///   let catalog = MockedCatalog::builder().build().reply("Dune", MockedReply::Items(vec![Item { id: 438631, title: "Dune".into(), ..Default::default() }]));
///   let marquee = Marquee::new(catalog, MemoryStore::default()).build();
///
///   if let SearchOutcome::Success { results } = marquee.search("Dune").await {
///     println!("found {} movies", results.len());
///   }
///
///   for record in marquee.trending(5).await.unwrap() {
///     println!("{} was searched {} times", record.term, record.count);
///   }
/// # });
/// ```
#[derive(Clone, Debug)]
pub struct Marquee<C: CatalogProvider, S: CounterStore> {
  catalog: C,
  trending: TrendingAggregator<S>,
  config: MarqueeConfig,
}

#[bon]
impl<C: CatalogProvider, S: CounterStore> Marquee<C, S> {
  /// Create a new Marquee instance.
  ///
  /// This struct can be safely cloned and sent across thread boundaries, all
  /// clones sharing the same catalog and counter store.
  #[allow(clippy::new_ret_no_self)]
  #[builder(start_fn = new, finish_fn = build)]
  pub fn _new(#[builder(start_fn)] catalog: C, #[builder(start_fn)] store: S, #[builder(default)] config: MarqueeConfig) -> Marquee<C, S> {
    Marquee {
      catalog,
      trending: TrendingAggregator::new(store, config.store_timeout),
      config,
    }
  }
}

impl<C: CatalogProvider, S: CounterStore> Marquee<C, S> {
  pub fn config(&self) -> &MarqueeConfig {
    &self.config
  }

  pub fn catalog(&self) -> &C {
    &self.catalog
  }

  pub fn trending_aggregator(&self) -> &TrendingAggregator<S> {
    &self.trending
  }

  /// Whether both the catalog and the counter store are available.
  pub async fn health(&self) -> Result<bool, MarqueeError> {
    if !self.catalog.health().await? {
      return Ok(false);
    }

    self.trending.health().await
  }

  /// Run a single search, independent from any session.
  ///
  /// An empty query lists popular movies instead. Successful term searches
  /// are recorded as trending before this returns.
  #[instrument(skip(self))]
  pub async fn search(&self, query: &str) -> SearchOutcome {
    let request = SearchRequest {
      sequence: 0,
      query: query.to_string(),
    };

    let (outcome, top) = executor::execute(&self.catalog, self.config.catalog_timeout, &request).await;

    executor::record(&self.trending, &request, top.as_ref()).await;

    outcome
  }

  /// The `limit` most searched terms, most popular first.
  pub async fn trending(&self, limit: usize) -> Result<Vec<TrendingRecord>, MarqueeError> {
    self.trending.top_n(limit).await
  }

  /// A standalone executor, with its own sequence of requests.
  pub fn executor(&self) -> QueryExecutor<C, S> {
    QueryExecutor::new(self.catalog.clone(), self.trending.clone(), self.config)
  }

  /// Open a debounced search session.
  ///
  /// Must be called from within a Tokio runtime.
  pub fn session(&self) -> Session<C, S> {
    Session::start(self.executor(), self.config.debounce)
  }
}
