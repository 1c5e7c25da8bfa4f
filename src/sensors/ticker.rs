//! Cancellable recurring task.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// A callback run once per period on the tokio runtime until stopped.
///
/// The first tick fires one full period after spawning. Dropping the task
/// stops it.
pub struct RecurringTask {
    handle: Option<JoinHandle<()>>,
}

impl RecurringTask {
    /// Spawn `tick` every `period`. Must be called inside a tokio runtime.
    pub fn spawn<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick();
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    /// Stop ticking. Calling it again is a no-op.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for RecurringTask {
    fn drop(&mut self) {
        self.stop();
    }
}
