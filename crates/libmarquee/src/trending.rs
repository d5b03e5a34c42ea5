use std::time::Duration;

use jiff::Timestamp;
use metrics::counter;
use tokio::time::timeout;
use tracing::instrument;

use crate::{
  error::MarqueeError,
  model::{Item, TrendingRecord, normalize_term},
  store::CounterStore,
};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Records searched terms and ranks them by popularity.
#[derive(Clone, Debug)]
pub struct TrendingAggregator<S: CounterStore> {
  store: S,
  timeout: Duration,
}

impl<S: CounterStore> TrendingAggregator<S> {
  pub fn new(store: S, timeout: Duration) -> TrendingAggregator<S> {
    TrendingAggregator { store, timeout }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  pub async fn health(&self) -> Result<bool, MarqueeError> {
    self.bounded(self.store.health()).await
  }

  /// Count one more search for `query`, remembering `item` if the term is new.
  ///
  /// Queries that are blank once normalized are ignored and yield `None`.
  #[instrument(skip_all)]
  pub async fn record(&self, query: &str, item: &Item) -> Result<Option<TrendingRecord>, MarqueeError> {
    let term = normalize_term(query);

    if term.is_empty() {
      return Ok(None);
    }

    match self.bounded(self.store.upsert_increment(&term, item, Timestamp::now())).await {
      Ok(record) => {
        counter!("marquee_trending_records_total").increment(1);

        tracing::debug!(term = %record.term, count = record.count, "recorded search term");

        Ok(Some(record))
      }

      Err(err) => {
        counter!("marquee_trending_failures_total").increment(1);

        Err(err)
      }
    }
  }

  /// The `limit` most searched terms.
  #[instrument(skip_all)]
  pub async fn top_n(&self, limit: usize) -> Result<Vec<TrendingRecord>, MarqueeError> {
    if limit == 0 {
      return Err(MarqueeError::ConfigError("trending limit must be greater than zero".into()));
    }

    let mut records = self.bounded(self.store.query_top_n(limit)).await?;

    records.truncate(limit);

    Ok(records)
  }

  async fn bounded<T>(&self, operation: impl Future<Output = Result<T, MarqueeError>>) -> Result<T, MarqueeError> {
    match timeout(self.timeout, operation).await {
      Ok(Ok(value)) => Ok(value),
      Ok(Err(err @ MarqueeError::StoreError(_))) => Err(err),
      Ok(Err(err)) => Err(MarqueeError::StoreError(err.to_string())),
      Err(_) => Err(MarqueeError::StoreError(format!("no response within {}ms", self.timeout.as_millis()))),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use jiff::Timestamp;

  use super::TrendingAggregator;
  use crate::{
    error::MarqueeError,
    model::{Item, TrendingRecord},
    store::{CounterStore, memory::MemoryStore},
  };

  #[derive(Clone)]
  struct HangingStore;

  impl CounterStore for HangingStore {
    async fn health(&self) -> Result<bool, MarqueeError> {
      std::future::pending().await
    }

    async fn upsert_increment(&self, _: &str, _: &Item, _: Timestamp) -> Result<TrendingRecord, MarqueeError> {
      std::future::pending().await
    }

    async fn query_top_n(&self, _: usize) -> Result<Vec<TrendingRecord>, MarqueeError> {
      std::future::pending().await
    }
  }

  fn item(id: u64) -> Item {
    Item {
      id,
      title: format!("Movie #{id}"),
      ..Default::default()
    }
  }

  #[tokio::test]
  async fn record_round_trip() {
    let trending = TrendingAggregator::new(MemoryStore::default(), Duration::from_secs(1));

    let record = trending.record("Dune", &item(1)).await.unwrap().unwrap();

    assert_eq!(record.term, "dune");
    assert_eq!(record.count, 1);
    assert_eq!(record.item, item(1));

    let record = trending.record("  DUNE ", &item(2)).await.unwrap().unwrap();

    assert_eq!(record.count, 2);
    assert_eq!(record.item, item(1));
    assert_eq!(trending.store().len(), 1);
  }

  #[tokio::test]
  async fn blank_queries_are_not_recorded() {
    let trending = TrendingAggregator::new(MemoryStore::default(), Duration::from_secs(1));

    assert!(trending.record("", &item(1)).await.unwrap().is_none());
    assert!(trending.record("   ", &item(1)).await.unwrap().is_none());
    assert!(trending.store().is_empty());
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn concurrent_records() {
    let trending = TrendingAggregator::new(MemoryStore::default(), Duration::from_secs(5));

    let tasks = (0..64)
      .map(|i| {
        let trending = trending.clone();
        let query = if i % 2 == 0 { "Dune" } else { "dune " };

        tokio::spawn(async move { trending.record(query, &item(i)).await })
      })
      .collect::<Vec<_>>();

    for task in tasks {
      task.await.unwrap().unwrap();
    }

    assert_eq!(trending.store().get("dune").unwrap().count, 64);
  }

  #[tokio::test]
  async fn top_n() {
    let trending = TrendingAggregator::new(MemoryStore::default(), Duration::from_secs(1));

    for (query, times) in [("Dune", 3), ("Alien", 1), ("Heat", 2)] {
      for _ in 0..times {
        trending.record(query, &item(1)).await.unwrap();
      }
    }

    let top = trending.top_n(2).await.unwrap();

    assert_eq!(top.iter().map(|record| record.term.as_str()).collect::<Vec<_>>(), ["dune", "heat"]);
    assert!(matches!(trending.top_n(0).await, Err(MarqueeError::ConfigError(_))));
  }

  #[tokio::test(start_paused = true)]
  async fn store_timeouts() {
    let trending = TrendingAggregator::new(HangingStore, Duration::from_millis(100));

    assert!(matches!(trending.record("dune", &item(1)).await, Err(MarqueeError::StoreError(_))));
    assert!(matches!(trending.top_n(5).await, Err(MarqueeError::StoreError(_))));
    assert!(matches!(trending.health().await, Err(MarqueeError::StoreError(_))));
  }
}
