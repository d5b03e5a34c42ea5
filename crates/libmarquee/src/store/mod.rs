pub mod elastic;
pub mod memory;

use jiff::Timestamp;

use crate::{
  error::MarqueeError,
  model::{Item, TrendingRecord},
};

/// Shared key-counter store backing the trending list.
///
/// Implementations must make [`CounterStore::upsert_increment`] atomic: two
/// concurrent increments of the same term both have to be counted.
#[allow(async_fn_in_trait)]
pub trait CounterStore: Clone + Send + Sync + 'static {
  fn health(&self) -> impl Future<Output = Result<bool, MarqueeError>> + Send;

  /// Create the record for `term` with a count of one, or add one to its count.
  ///
  /// `item` is only stored when the record is created. Returns the record as
  /// it stands after the write.
  fn upsert_increment(&self, term: &str, item: &Item, now: Timestamp) -> impl Future<Output = Result<TrendingRecord, MarqueeError>> + Send;

  fn query_top_n(&self, limit: usize) -> impl Future<Output = Result<Vec<TrendingRecord>, MarqueeError>> + Send;
}
