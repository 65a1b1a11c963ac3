//! Cancellable deferred work
//!
//! A [`TimerHandle`] owns a spawned task that sleeps for a delay and then
//! runs a callback. Cancelling before the delay elapses guarantees the
//! callback never runs.

use crate::error::TimerError;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Handle to one scheduled callback
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Run `callback` after `delay` on the current runtime
    ///
    /// # Errors
    /// - `TimerError::NoRuntime` if called outside a tokio runtime
    pub fn schedule<F>(delay: Duration, callback: F) -> Result<Self, TimerError>
    where
        F: FnOnce() + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| TimerError::NoRuntime)?;
        Ok(Self::schedule_on(&runtime, delay, callback))
    }

    /// Run `callback` after `delay` on `runtime`
    pub fn schedule_on<F>(runtime: &Handle, delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        Self { task }
    }

    /// Prevent the callback from running if it has not started
    #[inline]
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the timer fired or was cancelled
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the timer to settle
    ///
    /// # Returns
    /// `true` if the callback ran, `false` if the timer was cancelled
    pub async fn wait(self) -> bool {
        match self.task.await {
            Ok(()) => true,
            Err(e) if e.is_cancelled() => false,
            Err(e) => {
                tracing::error!(error = %e, "timer callback panicked");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn timer_fires_after_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let timer = TimerHandle::schedule(Duration::from_secs(60), move || {
            flag.store(true, Ordering::SeqCst);
        })
        .unwrap();

        assert!(!fired.load(Ordering::SeqCst));
        assert!(timer.wait().await);
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let timer = TimerHandle::schedule(Duration::from_secs(60), move || {
            flag.store(true, Ordering::SeqCst);
        })
        .unwrap();

        timer.cancel();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(!timer.wait().await);
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn scheduling_outside_runtime_fails() {
        let result = TimerHandle::schedule(Duration::from_secs(1), || {});
        assert_eq!(result.unwrap_err(), TimerError::NoRuntime);
    }
}
