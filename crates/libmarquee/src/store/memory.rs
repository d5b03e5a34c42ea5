use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use ahash::RandomState;
use jiff::Timestamp;

use crate::{
  error::MarqueeError,
  model::{self, Item, TrendingRecord},
  store::CounterStore,
};

/// Process-local counter store.
///
/// Every increment happens inside a single critical section over the map, so
/// concurrent sessions of the same process never lose a count.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
  records: Arc<Mutex<HashMap<String, TrendingRecord, RandomState>>>,
}

impl MemoryStore {
  pub fn with_records(records: Vec<TrendingRecord>) -> MemoryStore {
    MemoryStore {
      records: Arc::new(Mutex::new(records.into_iter().map(|record| (record.term.clone(), record)).collect())),
    }
  }

  pub fn get(&self, term: &str) -> Option<TrendingRecord> {
    self.records.lock().unwrap_or_else(PoisonError::into_inner).get(term).cloned()
  }

  pub fn len(&self) -> usize {
    self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl CounterStore for MemoryStore {
  async fn health(&self) -> Result<bool, MarqueeError> {
    Ok(true)
  }

  async fn upsert_increment(&self, term: &str, item: &Item, now: Timestamp) -> Result<TrendingRecord, MarqueeError> {
    let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);

    let record = records
      .entry(term.to_string())
      .and_modify(|record| {
        record.count += 1;
        record.last_updated = now;
      })
      .or_insert_with(|| TrendingRecord {
        term: term.to_string(),
        count: 1,
        item: item.clone(),
        first_seen: now,
        last_updated: now,
      });

    Ok(record.clone())
  }

  async fn query_top_n(&self, limit: usize) -> Result<Vec<TrendingRecord>, MarqueeError> {
    let records = self.records.lock().unwrap_or_else(PoisonError::into_inner).values().cloned().collect::<Vec<_>>();

    Ok(model::rank(records, limit))
  }
}
