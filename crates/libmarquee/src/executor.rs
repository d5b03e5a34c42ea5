use std::{
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use metrics::{counter, histogram};
use tokio::{
  sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
  task::{AbortHandle, JoinHandle},
  time::{Instant, timeout},
};
use tracing::Instrument;

use crate::{
  catalog::{CatalogProvider, Endpoint},
  error::MarqueeError,
  marquee::MarqueeConfig,
  model::{Item, OutcomeSnapshot, SearchOutcome, SearchRequest},
  store::CounterStore,
  trending::TrendingAggregator,
};

pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome state guarded by request sequence numbers.
///
/// Every settled query is issued a strictly increasing sequence number, and
/// only the resolution of the most recently issued request is ever applied.
/// Responses arriving late for an older query are discarded, whatever order
/// the network delivers them in.
#[derive(Debug, Default)]
pub struct SearchState {
  issued: u64,
  current: OutcomeSnapshot,
  observers: Vec<UnboundedSender<OutcomeSnapshot>>,
}

impl SearchState {
  pub fn snapshot(&self) -> &OutcomeSnapshot {
    &self.current
  }

  pub fn latest_sequence(&self) -> u64 {
    self.issued
  }

  /// Receive the current snapshot, then every later transition, in order.
  pub fn subscribe(&mut self) -> UnboundedReceiver<OutcomeSnapshot> {
    let (sender, receiver) = mpsc::unbounded_channel();

    if sender.send(self.current.clone()).is_ok() {
      self.observers.push(sender);
    }

    receiver
  }

  /// Issue the next request and switch to `Loading`.
  pub fn begin(&mut self, query: impl Into<String>) -> SearchRequest {
    self.issued += 1;

    let request = SearchRequest {
      sequence: self.issued,
      query: query.into(),
    };

    self.publish(OutcomeSnapshot {
      sequence: request.sequence,
      query: Some(request.query.clone()),
      outcome: SearchOutcome::Loading,
    });

    request
  }

  /// Apply the outcome of `request` if it is still the latest one.
  ///
  /// Returns whether the outcome was applied. A request resolves at most once.
  pub fn resolve(&mut self, request: &SearchRequest, outcome: SearchOutcome) -> bool {
    if request.sequence != self.issued || self.current.sequence != request.sequence || self.current.outcome != SearchOutcome::Loading {
      return false;
    }

    self.publish(OutcomeSnapshot {
      sequence: request.sequence,
      query: Some(request.query.clone()),
      outcome,
    });

    true
  }

  fn publish(&mut self, snapshot: OutcomeSnapshot) {
    self.observers.retain(|observer| observer.send(snapshot.clone()).is_ok());
    self.current = snapshot;
  }
}

/// What became of one submitted request.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
  pub request: SearchRequest,
  pub outcome: SearchOutcome,
  /// `false` when a newer request had been issued by the time this one resolved.
  pub applied: bool,
}

/// Turns settled queries into catalog requests and owns the resulting outcome.
///
/// Submitting never waits for, nor queues behind, a request in flight: the
/// new request supersedes it. Successful term searches with at least one
/// result are recorded as trending, and a failure to record never changes the
/// search outcome.
#[derive(Clone)]
pub struct QueryExecutor<C: CatalogProvider, S: CounterStore> {
  shared: Arc<Shared<C, S>>,
}

struct Shared<C: CatalogProvider, S: CounterStore> {
  catalog: C,
  trending: TrendingAggregator<S>,
  config: MarqueeConfig,
  state: Mutex<ExecutorState>,
}

#[derive(Default)]
struct ExecutorState {
  search: SearchState,
  in_flight: Option<(u64, AbortHandle)>,
}

impl<C: CatalogProvider, S: CounterStore> QueryExecutor<C, S> {
  pub fn new(catalog: C, trending: TrendingAggregator<S>, config: MarqueeConfig) -> QueryExecutor<C, S> {
    QueryExecutor {
      shared: Arc::new(Shared {
        catalog,
        trending,
        config,
        state: Mutex::default(),
      }),
    }
  }

  /// Issue a request for `query`, superseding the one in flight.
  ///
  /// The outcome switches to `Loading` before this returns. The returned
  /// handle can be awaited for the resolution or simply dropped.
  pub fn submit(&self, query: impl Into<String>) -> JoinHandle<Resolution> {
    let mut state = self.shared.state();
    let request = state.search.begin(query);
    let sequence = request.sequence;

    let task = tokio::spawn(Arc::clone(&self.shared).run(request).in_current_span());

    if let Some((_, previous)) = state.in_flight.replace((sequence, task.abort_handle()))
      && self.shared.config.cancel_superseded
    {
      previous.abort();
    }

    task
  }

  pub fn snapshot(&self) -> OutcomeSnapshot {
    self.shared.state().search.snapshot().clone()
  }

  pub fn subscribe(&self) -> UnboundedReceiver<OutcomeSnapshot> {
    self.shared.state().search.subscribe()
  }

  /// Abort the request in flight, if any.
  pub fn cancel(&self) {
    if let Some((_, task)) = self.shared.state().in_flight.take() {
      task.abort();
    }
  }
}

impl<C: CatalogProvider, S: CounterStore> Shared<C, S> {
  fn state(&self) -> MutexGuard<'_, ExecutorState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  async fn run(self: Arc<Self>, request: SearchRequest) -> Resolution {
    let (outcome, top) = execute(&self.catalog, self.config.catalog_timeout, &request).await;

    let applied = {
      let mut state = self.state();
      let applied = state.search.resolve(&request, outcome.clone());

      // From here on the task must run to completion, or the search would not be counted.
      if applied && state.in_flight.as_ref().is_some_and(|(sequence, _)| *sequence == request.sequence) {
        state.in_flight = None;
      }

      applied
    };

    match applied {
      true => record(&self.trending, &request, top.as_ref()).await,

      false => {
        counter!("marquee_superseded_responses_total").increment(1);

        tracing::debug!(sequence = request.sequence, query = %request.query, "dropping superseded response");
      }
    }

    Resolution { request, outcome, applied }
  }
}

/// Fetch the listing for `request` and map it to an outcome.
///
/// Also returns the best ranked item of a successful response, if any.
pub(crate) async fn execute<C: CatalogProvider>(catalog: &C, limit: Duration, request: &SearchRequest) -> (SearchOutcome, Option<Item>) {
  let endpoint = Endpoint::for_query(&request.query);
  let then = Instant::now();

  let result = match timeout(limit, endpoint.fetch(catalog, &request.query)).await {
    Ok(result) => result,
    Err(_) => Err(MarqueeError::TransportError(format!("no response within {}ms", limit.as_millis()))),
  };

  histogram!("marquee_catalog_latency_seconds", "endpoint" => endpoint.to_string()).record(then.elapsed().as_secs_f64());

  match result {
    Ok(results) => {
      counter!("marquee_catalog_requests_total", "endpoint" => endpoint.to_string(), "status" => "success").increment(1);

      let top = results.first().cloned();

      (SearchOutcome::Success { results }, top)
    }

    Err(err) => {
      counter!("marquee_catalog_requests_total", "endpoint" => endpoint.to_string(), "status" => "failure").increment(1);

      tracing::error!(error = %err, sequence = request.sequence, %endpoint, "could not fetch movies");

      (SearchOutcome::Failure { message: err.user_message() }, None)
    }
  }
}

/// Count a successful term search, logging instead of failing.
pub(crate) async fn record<S: CounterStore>(trending: &TrendingAggregator<S>, request: &SearchRequest, top: Option<&Item>) {
  let Some(top) = top else {
    return;
  };

  if request.is_discover() {
    return;
  }

  if let Err(err) = trending.record(&request.query, top).await {
    tracing::warn!(error = %err, query = %request.query, "could not record trending search");
  }
}
