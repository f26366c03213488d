//! Cancellable background work on a fixed period.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Runs a closure every `period` until cancelled or dropped.
///
/// The first run happens one period after spawning.
pub struct PeriodicTask {
  name: &'static str,
  cancel: watch::Sender<bool>,
  handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
  pub fn spawn<F>(name: &'static str, period: Duration, mut work: F) -> Self
  where
    F: FnMut() + Send + 'static,
  {
    let (cancel, mut cancelled) = watch::channel(false);

    let handle = tokio::spawn(async move {
      let mut ticker = interval_at(Instant::now() + period, period);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      debug!(task = name, ?period, "periodic task started");

      loop {
        tokio::select! {
          _ = ticker.tick() => work(),
          changed = cancelled.changed() => {
            // A dropped sender counts as cancellation too
            if changed.is_err() || *cancelled.borrow() {
              break;
            }
          }
        }
      }

      debug!(task = name, "periodic task stopped");
    });

    Self {
      name,
      cancel,
      handle: Some(handle),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  /// Stop the task and wait for it to exit
  pub async fn cancel(mut self) {
    let _ = self.cancel.send(true);
    if let Some(handle) = self.handle.take() {
      let _ = handle.await;
    }
  }
}

impl Drop for PeriodicTask {
  fn drop(&mut self) {
    let _ = self.cancel.send(true);
  }
}
