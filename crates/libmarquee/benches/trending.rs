use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use jiff::Timestamp;

use libmarquee::prelude::*;

fn records(count: u64) -> Vec<TrendingRecord> {
  (0..count)
    .map(|i| TrendingRecord {
      term: format!("term {i}"),
      count: i % 17,
      item: Item { id: i, ..Default::default() },
      first_seen: Timestamp::UNIX_EPOCH,
      last_updated: Timestamp::UNIX_EPOCH,
    })
    .collect()
}

fn normalize(c: &mut Criterion) {
  c.bench_function("normalize_term", |b| b.iter(|| black_box(normalize_term("  The  Lord of the Ｒｉｎｇｓ:   The Fellowship  "))));
}

fn ranking(c: &mut Criterion) {
  let records = records(10_000);

  c.bench_function("rank", |b| b.iter(|| black_box(rank(records.clone(), 5))));
}

fn memory_upsert(c: &mut Criterion) {
  let runtime = tokio::runtime::Builder::new_multi_thread().build().unwrap();
  let store = MemoryStore::default();
  let item = Item { id: 438631, ..Default::default() };

  c.bench_function("memory_upsert", |b| b.to_async(&runtime).iter(|| store.upsert_increment("dune", &item, Timestamp::UNIX_EPOCH)));
}

criterion_group!(benches, normalize, ranking, memory_upsert);
criterion_main!(benches);
