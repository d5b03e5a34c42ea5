use std::{
  collections::{HashMap, VecDeque},
  sync::{Arc, Mutex, PoisonError},
  time::Duration,
};

use ahash::RandomState;
use bon::bon;

use crate::{catalog::CatalogProvider, error::MarqueeError, model::Item};

/// Scripted answer of the mocked catalog.
#[derive(Clone, Debug)]
pub enum MockedReply {
  Items(Vec<Item>),
  Application(Option<String>),
  Transport(String),
  /// Never answers.
  Hang,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MockedCall {
  Search(String),
  Discover,
}

/// In-process catalog used by tests.
///
/// Replies are scripted per query (the empty query addresses the discover
/// listing) and consumed in order, the last one being repeated. Unscripted
/// queries answer with an empty listing.
#[derive(Clone, Debug, Default)]
pub struct MockedCatalog {
  healthy: bool,
  replies: Arc<Mutex<HashMap<String, VecDeque<(Duration, MockedReply)>, RandomState>>>,
  calls: Arc<Mutex<Vec<MockedCall>>>,
}

#[bon]
impl MockedCatalog {
  #[builder]
  pub fn new(#[builder(default = true)] healthy: bool) -> MockedCatalog {
    MockedCatalog { healthy, ..Default::default() }
  }
}

impl MockedCatalog {
  pub fn reply(self, query: &str, reply: MockedReply) -> MockedCatalog {
    self.reply_after(query, Duration::ZERO, reply)
  }

  pub fn reply_after(self, query: &str, delay: Duration, reply: MockedReply) -> MockedCatalog {
    self.replies.lock().unwrap_or_else(PoisonError::into_inner).entry(query.to_string()).or_default().push_back((delay, reply));
    self
  }

  /// Every call received so far, in order.
  pub fn calls(&self) -> Vec<MockedCall> {
    self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }

  async fn answer(&self, query: &str, call: MockedCall) -> Result<Vec<Item>, MarqueeError> {
    self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);

    let scripted = {
      let mut replies = self.replies.lock().unwrap_or_else(PoisonError::into_inner);

      match replies.get_mut(query) {
        Some(queue) if queue.len() > 1 => queue.pop_front(),
        Some(queue) => queue.front().cloned(),
        None => None,
      }
    };

    let Some((delay, reply)) = scripted else {
      return Ok(Vec::new());
    };

    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }

    match reply {
      MockedReply::Items(items) => Ok(items),
      MockedReply::Application(message) => Err(MarqueeError::ApplicationError(message)),
      MockedReply::Transport(message) => Err(MarqueeError::TransportError(message)),
      MockedReply::Hang => std::future::pending().await,
    }
  }
}

impl CatalogProvider for MockedCatalog {
  async fn health(&self) -> Result<bool, MarqueeError> {
    Ok(self.healthy)
  }

  async fn search(&self, term: &str) -> Result<Vec<Item>, MarqueeError> {
    self.answer(term, MockedCall::Search(term.to_string())).await
  }

  async fn discover(&self) -> Result<Vec<Item>, MarqueeError> {
    self.answer("", MockedCall::Discover).await
  }
}
