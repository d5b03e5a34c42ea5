use std::time::Duration;

use tokio::{
  sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
  time::{Instant, sleep_until},
};
use tracing::Instrument;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug)]
enum Command {
  Input(String),
  Flush,
}

/// Collapses a stream of input changes into settled values.
///
/// A value is emitted once no other input was received for the configured
/// delay, and a newer input always replaces the pending one, which is then
/// never emitted. The timer lives in a background task that is the only
/// emitter, and that stops (dropping whatever is pending) when the debouncer
/// is dropped.
#[derive(Debug)]
pub struct Debouncer {
  delay: Duration,
  commands: UnboundedSender<Command>,
}

impl Debouncer {
  /// Start a debouncer, returning it and the channel settled values are sent to.
  pub fn spawn(delay: Duration) -> (Debouncer, UnboundedReceiver<String>) {
    let (commands, mut inputs) = mpsc::unbounded_channel();
    let (settled, output) = mpsc::unbounded_channel();

    tokio::spawn(
      async move {
        let mut pending: Option<(String, Instant)> = None;

        loop {
          let deadline = pending.as_ref().map(|(_, at)| *at);

          tokio::select! {
            biased;

            command = inputs.recv() => match command {
              Some(Command::Input(value)) => pending = Some((value, Instant::now() + delay)),

              Some(Command::Flush) => {
                if let Some((value, _)) = pending.take()
                  && settled.send(value).is_err()
                {
                  break;
                }
              }

              None => break,
            },

            () = wait(deadline) => {
              if let Some((value, _)) = pending.take() {
                tracing::trace!(%value, "input settled");

                if settled.send(value).is_err() {
                  break;
                }
              }
            }
          }
        }
      }
      .in_current_span(),
    );

    (Debouncer { delay, commands }, output)
  }

  pub fn delay(&self) -> Duration {
    self.delay
  }

  /// Register a new input value, restarting the quiet period.
  pub fn on_input(&self, value: impl Into<String>) {
    let _ = self.commands.send(Command::Input(value.into()));
  }

  /// Emit the pending value right away, if there is one.
  pub fn flush(&self) {
    let _ = self.commands.send(Command::Flush);
  }
}

async fn wait(deadline: Option<Instant>) {
  match deadline {
    Some(deadline) => sleep_until(deadline).await,
    None => std::future::pending().await,
  }
}
