use std::time::Duration;

use libmarquee::prelude::*;

use crate::api::{AppState, config::Config};

mod api;

fn state(config: Config, catalog: MockedCatalog) -> AppState<MockedCatalog, MemoryStore> {
  let marquee = Marquee::new(catalog, MemoryStore::default())
    .config(MarqueeConfig {
      debounce: Duration::from_millis(200),
      ..config.marquee_config()
    })
    .build();

  AppState::new(config, marquee, None)
}

fn movie(id: u64, title: &str) -> Item {
  Item {
    id,
    title: title.into(),
    ..Default::default()
  }
}
