//! Replace-on-reschedule delayed execution.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs only the most recently scheduled call, once `delay` has passed without a
/// newer one replacing it.
///
/// Rescheduling or cancelling only stops a call that is still waiting out its delay.
/// Once the delay elapses the call runs as its own task and is left to finish.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: Mutex::new(None) }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `task` to run after the delay, dropping any call still waiting
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detached so a later abort only reaches the timer
            tokio::spawn(task);
        });

        let previous = self.slot().replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Drop the pending call, if any. Returns whether one was still waiting.
    ///
    /// A call whose delay already elapsed keeps running.
    pub fn cancel(&self) -> bool {
        match self.slot().take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    /// Whether a scheduled call is still waiting out its delay
    pub fn is_pending(&self) -> bool {
        self.slot().as_ref().is_some_and(|handle| !handle.is_finished())
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.slot().take() {
            handle.abort();
        }
    }
}
