//! # Wait group for job-group completion.
//!
//! [`WaitGroup`] is a counter paired with a [`Notify`]: callers `add` before
//! dispatching jobs, each job context releases it once via `done`, and
//! `wait` resolves when the counter reaches zero.
//!
//! ```text
//! wg.add(1) ─► ctx.set_wait_group(wg) ─► run_job(async)
//!                                            └─► ctx.result(..) ─► wg.done()
//! wg.wait().await  (resolves when every attached context finished)
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

struct Inner {
    count: AtomicUsize,
    notify: Notify,
}

/// Cloneable handle to a shared completion counter.
#[derive(Clone)]
pub struct WaitGroup {
    inner: Arc<Inner>,
}

impl WaitGroup {
    /// Creates a wait group with a zero counter.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                count: AtomicUsize::new(0),
                notify: Notify::new(),
            }),
        }
    }

    /// Increments the counter by `n`.
    pub fn add(&self, n: usize) {
        self.inner.count.fetch_add(n, Ordering::AcqRel);
    }

    /// Decrements the counter, waking waiters when it reaches zero.
    ///
    /// Extra calls on a zero counter are ignored.
    pub fn done(&self) {
        let prev = self
            .inner
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| c.checked_sub(1));
        match prev {
            Ok(1) => self.inner.notify.notify_waiters(),
            Ok(_) => {}
            Err(_) => tracing::debug!("wait group released more times than added"),
        }
    }

    /// Returns the current counter value.
    pub fn count(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    /// Waits until the counter is zero.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WaitGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitGroup")
            .field("count", &self.count())
            .finish()
    }
}
