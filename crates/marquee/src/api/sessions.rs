use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use ahash::RandomState;
use libmarquee::prelude::*;
use tokio::{task::JoinHandle, time::Instant};
use uuid::Uuid;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct Entry<C: CatalogProvider, S: CounterStore> {
  session: Session<C, S>,
  last_seen: Instant,
}

/// Open search sessions, by ID.
///
/// Every access to a session counts as activity. Sessions left alone for
/// longer than the idle timeout are closed by [`SessionRegistry::sweep`].
#[derive(Clone)]
pub struct SessionRegistry<C: CatalogProvider, S: CounterStore> {
  sessions: Arc<Mutex<HashMap<Uuid, Entry<C, S>, RandomState>>>,
  idle_timeout: Duration,
}

impl<C: CatalogProvider, S: CounterStore> SessionRegistry<C, S> {
  pub fn new(idle_timeout: Duration) -> SessionRegistry<C, S> {
    SessionRegistry {
      sessions: Arc::default(),
      idle_timeout,
    }
  }

  fn sessions(&self) -> MutexGuard<'_, HashMap<Uuid, Entry<C, S>, RandomState>> {
    self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn open(&self, marquee: &Marquee<C, S>) -> Uuid {
    let id = Uuid::new_v4();
    let entry = Entry {
      session: marquee.session(),
      last_seen: Instant::now(),
    };

    self.sessions().insert(id, entry);

    tracing::debug!(session = %id, "opened search session");

    id
  }

  /// Run `f` against the session `id`, if it is still open.
  pub fn with<R>(&self, id: &Uuid, f: impl FnOnce(&Session<C, S>) -> R) -> Option<R> {
    let mut sessions = self.sessions();
    let entry = sessions.get_mut(id)?;

    entry.last_seen = Instant::now();

    Some(f(&entry.session))
  }

  pub fn close(&self, id: &Uuid) -> bool {
    let closed = self.sessions().remove(id).is_some();

    if closed {
      tracing::debug!(session = %id, "closed search session");
    }

    closed
  }

  pub fn len(&self) -> usize {
    self.sessions().len()
  }

  /// Close every session idle for longer than the timeout, returning how many were closed.
  pub fn sweep(&self) -> usize {
    let now = Instant::now();
    let mut sessions = self.sessions();
    let before = sessions.len();

    sessions.retain(|_, entry| now.duration_since(entry.last_seen) <= self.idle_timeout);

    before - sessions.len()
  }

  /// Periodically evict idle sessions in the background.
  pub fn spawn_sweeper(&self) -> JoinHandle<()> {
    let registry = self.clone();
    let interval = self.idle_timeout.min(SWEEP_INTERVAL);

    tokio::spawn(async move {
      loop {
        tokio::time::sleep(interval).await;

        let evicted = registry.sweep();

        if evicted > 0 {
          tracing::info!(evicted, remaining = registry.len(), "evicted idle search sessions");
        }
      }
    })
  }
}
