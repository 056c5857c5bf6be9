//! Periodic background tasks
//!
//! Each poll runs on its own tokio task and lives exactly as long as its
//! [`PollHandle`]: dropping the handle aborts the task.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Owner of a running poll loop
#[derive(Debug)]
pub struct PollHandle {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl PollHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop polling now
    pub fn stop(self) {
        // Drop does the work
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        debug!("Stopping {} poll", self.name);
        self.handle.abort();
    }
}

/// Run `task` every `period`, first tick one period from now.
///
/// Ticks never overlap: a slow task delays the next one instead of queueing
/// a burst.
pub fn spawn_poll<F, Fut>(name: &'static str, period: Duration, mut task: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            debug!("{} poll tick", name);
            task().await;
        }
    });

    PollHandle { name, handle }
}

/// The dashboard's two background polls
#[derive(Debug)]
pub struct Watchers {
    pub unread_updates: Option<PollHandle>,
    pub invitations: PollHandle,
}

impl Watchers {
    pub fn stop(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_poll_waits_one_period_before_first_tick() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let _handle = spawn_poll("test", Duration::from_secs(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_secs(6)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_polling() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let handle = spawn_poll("test", Duration::from_secs(1), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        handle.stop();
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
