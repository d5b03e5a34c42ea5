use std::time::Duration;

use tokio::{sync::mpsc::UnboundedReceiver, task::AbortHandle};
use tracing::Instrument;

use crate::{
  catalog::CatalogProvider,
  debounce::Debouncer,
  executor::QueryExecutor,
  model::OutcomeSnapshot,
  store::CounterStore,
};

/// A debounced search box.
///
/// Opening a session immediately lists popular movies. Input values are then
/// debounced, and every settled value that differs from the last searched
/// query is handed to the session's executor. Dropping the session discards
/// any pending input and aborts the request in flight.
pub struct Session<C: CatalogProvider, S: CounterStore> {
  debouncer: Debouncer,
  executor: QueryExecutor<C, S>,
  pump: AbortHandle,
}

impl<C: CatalogProvider, S: CounterStore> Session<C, S> {
  pub(crate) fn start(executor: QueryExecutor<C, S>, delay: Duration) -> Session<C, S> {
    let (debouncer, mut settled) = Debouncer::spawn(delay);

    drop(executor.submit(""));

    let pump = tokio::spawn({
      let executor = executor.clone();

      async move {
        let mut last = String::new();

        while let Some(value) = settled.recv().await {
          if value == last {
            tracing::trace!(%value, "settled value did not change");
            continue;
          }

          drop(executor.submit(value.as_str()));
          last = value;
        }
      }
      .in_current_span()
    });

    Session {
      debouncer,
      executor,
      pump: pump.abort_handle(),
    }
  }

  pub fn debounce(&self) -> Duration {
    self.debouncer.delay()
  }

  /// Feed the current content of the search box.
  pub fn on_input(&self, value: impl Into<String>) {
    self.debouncer.on_input(value);
  }

  /// Search the pending input right away.
  pub fn flush(&self) {
    self.debouncer.flush();
  }

  pub fn snapshot(&self) -> OutcomeSnapshot {
    self.executor.snapshot()
  }

  pub fn subscribe(&self) -> UnboundedReceiver<OutcomeSnapshot> {
    self.executor.subscribe()
  }
}

impl<C: CatalogProvider, S: CounterStore> Drop for Session<C, S> {
  fn drop(&mut self) {
    self.pump.abort();
    self.executor.cancel();
  }
}
