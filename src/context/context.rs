//! # Job context: per-job execution state.
//!
//! A [`JobContext`] is a node in the tree of running jobs. It carries:
//! - a [`CancellationToken`] (cancelling a node cancels its child contexts)
//! - a single-shot result channel observed through [`ResultReceiver`]
//! - an optional [`WaitGroup`] released exactly once when the job finishes
//! - an optional deadline
//! - a [`tracing::Span`] used as the job's logger
//!
//! ## State machine
//! ```text
//!              result(..) / success()
//!   Alive ───────────────────────────────► Finished
//!     │                                      ▲
//!     │ timeout(d) expired                   │
//!     └──► cancel() ──► result(DeadlineExceeded)
//!
//! cancel():  token cancelled, is_alive() == false, no result published
//! ```
//!
//! ## Fork vs child
//! ```text
//! ctx.fork_context()   same token, same result channel, new span
//! ctx.child_context()  token = parent.child_token(), own result channel
//! ```
//!
//! ## Rules
//! - The first `result` wins; later calls are ignored
//! - The attached wait group is released exactly once, on every path
//! - `timeout` spawns a timer and must be called inside a Tokio runtime

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::Span;

use crate::context::receiver::{Outcome, ResultReceiver};
use crate::context::wait_group::WaitGroup;
use crate::error::JobError;

/// State shared by a context and all of its forks.
struct Shared {
    token: CancellationToken,
    /// Cancelled once the result is reported; stops deadline timers.
    done: CancellationToken,
    finished: AtomicBool,
    result: watch::Sender<Outcome>,
    wait_group: Mutex<Option<WaitGroup>>,
}

impl Shared {
    fn new(token: CancellationToken) -> Arc<Self> {
        let (result, _rx) = watch::channel(None);
        Arc::new(Self {
            token,
            done: CancellationToken::new(),
            finished: AtomicBool::new(false),
            result,
            wait_group: Mutex::new(None),
        })
    }

    fn wait_group(&self) -> MutexGuard<'_, Option<WaitGroup>> {
        self.wait_group.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Single-use gate: publishes `res`, stops timers, releases the wait group.
    fn finish(&self, span: &Span, res: Result<(), JobError>) -> bool {
        if self
            .finished
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(parent: span, "result already reported, ignoring");
            return false;
        }

        match &res {
            Ok(()) => tracing::debug!(parent: span, "job finished"),
            Err(e) => tracing::debug!(parent: span, error = %e, label = e.as_label(), "job finished with error"),
        }

        self.result.send_replace(Some(res));
        self.done.cancel();
        if let Some(wg) = self.wait_group().take() {
            wg.done();
        }
        true
    }
}

/// Job run context used to store job state and to communicate between the
/// runner and the job.
///
/// Cloning returns a handle to the same context (same span included).
#[derive(Clone)]
pub struct JobContext {
    shared: Arc<Shared>,
    span: Span,
    child: bool,
}

impl JobContext {
    /// Creates a root context logging into `span`.
    pub fn new(span: Span) -> Self {
        Self {
            shared: Shared::new(CancellationToken::new()),
            span,
            child: false,
        }
    }

    /// Creates a root context bound to an existing cancellation token.
    ///
    /// Cancelling `token` (or any of its parents) cancels the context.
    pub fn with_token(token: CancellationToken, span: Span) -> Self {
        Self {
            shared: Shared::new(token),
            span,
            child: false,
        }
    }

    /// Provides the logger for the current job context.
    pub fn log(&self) -> &Span {
        &self.span
    }

    /// Checks that the context was neither finished nor cancelled.
    pub fn is_alive(&self) -> bool {
        !self.shared.finished.load(Ordering::Acquire) && !self.shared.token.is_cancelled()
    }

    /// Checks if the context was created by [`JobContext::child_context`].
    pub fn is_child(&self) -> bool {
        self.child
    }

    /// Returns the cancellation token assigned to this context.
    pub fn token(&self) -> &CancellationToken {
        &self.shared.token
    }

    /// Resolves once the context (or one of its ancestors) is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.shared.token.cancelled()
    }

    /// Returns a receiver for the job result.
    pub fn errors(&self) -> ResultReceiver {
        ResultReceiver::new(self.shared.result.subscribe())
    }

    /// Waits for the job result. Shorthand for `errors().recv()`.
    pub async fn wait(&self) -> Result<(), JobError> {
        self.errors().recv().await
    }

    /// Attaches a wait group released when the job finishes.
    ///
    /// A group attached to an already finished context is released at once.
    /// Attaching a new group releases the one it replaces.
    pub fn set_wait_group(&self, wg: WaitGroup) {
        let replaced = {
            let mut slot = self.shared.wait_group();
            if self.shared.finished.load(Ordering::Acquire) {
                Some(wg)
            } else {
                slot.replace(wg)
            }
        };
        if let Some(wg) = replaced {
            wg.done();
        }
    }

    /// Creates a copy of the context with a separate sub-logger.
    ///
    /// The fork shares cancellation and result with the original.
    pub fn fork_context(&self) -> Self {
        self.fork_with_span(tracing::debug_span!(parent: &self.span, "fork"))
    }

    /// Same as [`JobContext::fork_context`] with a caller-provided span.
    pub fn fork_with_span(&self, span: Span) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            span,
            child: self.child,
        }
    }

    /// Creates a child context with its own result channel and a
    /// cancellation token derived from this context.
    pub fn child_context(&self) -> Self {
        Self {
            shared: Shared::new(self.shared.token.child_token()),
            span: tracing::debug_span!(parent: &self.span, "child"),
            child: true,
        }
    }

    /// Adds a deadline to the context.
    ///
    /// When `timeout` elapses before a result is reported the context is
    /// cancelled and finished with [`JobError::DeadlineExceeded`].
    /// A zero duration is ignored.
    pub fn timeout(&self, timeout: Duration) {
        if timeout == Duration::ZERO {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let span = self.span.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shared.done.cancelled() => {}
                _ = time::sleep(timeout) => {
                    // Finish before cancelling so observers of the token see the deadline result.
                    if shared.finish(&span, Err(JobError::DeadlineExceeded { deadline: timeout })) {
                        tracing::debug!(parent: &span, ?timeout, "deadline exceeded");
                    }
                    shared.token.cancel();
                }
            }
        });
    }

    /// Reports a successful result. Alias to `result(Ok(()))`.
    pub fn success(&self) -> bool {
        self.result(Ok(()))
    }

    /// Reports the job result and finishes the context.
    ///
    /// Returns `false` if a result had already been reported.
    pub fn result(&self, res: Result<(), JobError>) -> bool {
        self.shared.finish(&self.span, res)
    }

    /// Cancels the context and every child context derived from it.
    pub fn cancel(&self) {
        if !self.shared.token.is_cancelled() {
            tracing::debug!(parent: &self.span, "job context cancelled");
        }
        self.shared.token.cancel();
    }
}

impl Default for JobContext {
    fn default() -> Self {
        Self::new(Span::none())
    }
}

impl std::fmt::Debug for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("alive", &self.is_alive())
            .field("child", &self.child)
            .field("cancelled", &self.shared.token.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_result_is_single_shot() {
        let ctx = JobContext::default();
        let wg = WaitGroup::new();
        wg.add(2);
        ctx.set_wait_group(wg.clone());

        assert!(ctx.success());
        assert!(!ctx.success());
        assert!(!ctx.result(Err(JobError::fail("late"))));

        // released once, not twice
        assert_eq!(wg.count(), 1);
        assert_eq!(ctx.wait().await, Ok(()));
        assert!(!ctx.is_alive());
    }

    #[tokio::test]
    async fn test_wait_group_released_on_error() {
        let ctx = JobContext::default();
        let wg = WaitGroup::new();
        wg.add(1);
        ctx.set_wait_group(wg.clone());

        ctx.result(Err(JobError::fail("boom")));
        tokio::time::timeout(Duration::from_millis(50), wg.wait())
            .await
            .expect("wait group must be released");
        assert_eq!(ctx.wait().await, Err(JobError::fail("boom")));
    }

    #[tokio::test]
    async fn test_wait_group_attached_after_finish() {
        let ctx = JobContext::default();
        ctx.success();

        let wg = WaitGroup::new();
        wg.add(1);
        ctx.set_wait_group(wg.clone());
        assert_eq!(wg.count(), 0);
    }

    #[tokio::test]
    async fn test_parent_cancel_cascades_to_children() {
        let parent = JobContext::default();
        let child = parent.child_context();
        let grandchild = child.child_context();

        assert!(child.is_child());
        assert!(child.is_alive());

        parent.cancel();
        assert!(!parent.is_alive());
        assert!(!child.is_alive());
        assert!(!grandchild.is_alive());
        // cancellation alone reports nothing
        assert!(child.errors().try_recv().is_none());
    }

    #[tokio::test]
    async fn test_child_cancel_does_not_affect_parent() {
        let parent = JobContext::default();
        let child = parent.child_context();

        child.cancel();
        assert!(!child.is_alive());
        assert!(parent.is_alive());
    }

    #[tokio::test]
    async fn test_child_has_own_result_channel() {
        let parent = JobContext::default();
        let child = parent.child_context();

        child.result(Err(JobError::fail("child failed")));
        assert!(parent.errors().try_recv().is_none());
        assert!(parent.is_alive());
    }

    #[tokio::test]
    async fn test_fork_shares_identity() {
        let ctx = JobContext::default();
        let fork = ctx.fork_context();
        assert!(!fork.is_child());

        fork.success();
        assert!(!ctx.is_alive());
        assert_eq!(ctx.wait().await, Ok(()));

        let other = JobContext::default();
        other.fork_context().cancel();
        assert!(other.token().is_cancelled());
    }

    #[tokio::test]
    async fn test_deadline_finishes_context() {
        let ctx = JobContext::default();
        let started = Instant::now();
        ctx.timeout(Duration::from_millis(10));

        let res = tokio::time::timeout(Duration::from_millis(500), ctx.wait())
            .await
            .expect("deadline must finish the context");

        assert_eq!(
            res,
            Err(JobError::DeadlineExceeded {
                deadline: Duration::from_millis(10)
            })
        );
        assert!(started.elapsed() < Duration::from_millis(60));
        assert!(ctx.token().is_cancelled());
        assert!(!ctx.is_alive());
    }

    #[tokio::test]
    async fn test_result_before_deadline_wins() {
        let ctx = JobContext::default();
        ctx.timeout(Duration::from_millis(20));
        ctx.success();

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(ctx.wait().await, Ok(()));
        assert!(!ctx.token().is_cancelled());
    }

    #[tokio::test]
    async fn test_zero_timeout_is_ignored() {
        let ctx = JobContext::default();
        ctx.timeout(Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(ctx.is_alive());
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves() {
        let parent = JobContext::default();
        let child = parent.child_context();

        let waiter = {
            let child = child.clone();
            tokio::spawn(async move { child.cancelled().await })
        };
        parent.cancel();
        tokio::time::timeout(Duration::from_millis(50), waiter)
            .await
            .expect("child must observe parent cancellation")
            .unwrap();
    }
}
