//! # Job lifecycle events emitted by the runner.
//!
//! The [`EventKind`] enum classifies event types in two categories:
//! - **Job events**: dispatch flow (delay, skip, start, terminal outcome)
//! - **Subscriber events**: delivery problems in the fan-out set
//!
//! Every dispatched job produces exactly one terminal event:
//! `JobFinished`, `JobFailed`, `JobCanceled` or `DeadlineHit`.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use jobvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::JobFailed)
//!     .with_job("build")
//!     .with_reason("exit status 2")
//!     .with_deadline(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::JobFailed);
//! assert_eq!(ev.job.as_deref(), Some("build"));
//! assert_eq!(ev.deadline_ms, Some(5000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `job` (subscriber name) and `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `job` (subscriber name) and `reason`.
    SubscriberOverflow,

    // === Job events ===
    /// Job waits for its `delay` before starting.
    ///
    /// Sets `job`, `delay_ms`.
    DelayScheduled,

    /// Job condition failed; the job is skipped and reported as success.
    ///
    /// Sets `job`, `reason` (the expanded condition).
    JobSkipped,

    /// Job handler (or sub-task) is about to run.
    ///
    /// Sets `job`, `reason` (exec type label).
    JobStarting,

    /// Job reported success.
    ///
    /// Sets `job`.
    JobFinished,

    /// Job reported an error other than cancellation.
    ///
    /// Sets `job`, `reason` (error message), `label` (error label).
    JobFailed,

    /// Job was cancelled before finishing.
    ///
    /// Sets `job`.
    JobCanceled,

    /// Job ran out of its deadline.
    ///
    /// Sets `job`, `deadline_ms`.
    DeadlineHit,
}

impl EventKind {
    /// Stable snake_case name, used in overflow reasons and logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::SubscriberPanicked => "subscriber_panicked",
            EventKind::SubscriberOverflow => "subscriber_overflow",
            EventKind::DelayScheduled => "delay_scheduled",
            EventKind::JobSkipped => "job_skipped",
            EventKind::JobStarting => "job_starting",
            EventKind::JobFinished => "job_finished",
            EventKind::JobFailed => "job_failed",
            EventKind::JobCanceled => "job_canceled",
            EventKind::DeadlineHit => "deadline_hit",
        }
    }

    /// One of the four terminal job kinds.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventKind::JobFinished
                | EventKind::JobFailed
                | EventKind::JobCanceled
                | EventKind::DeadlineHit
        )
    }

    /// Whether the set of subscribers produced this event itself.
    #[inline]
    pub fn is_subscriber(&self) -> bool {
        matches!(self, EventKind::SubscriberPanicked | EventKind::SubscriberOverflow)
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Job description (or subscriber name for subscriber events).
    pub job: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Stable error label, see [`JobError::as_label`](crate::JobError::as_label).
    pub label: Option<&'static str>,
    /// Start delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Deadline in milliseconds (compact).
    pub deadline_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            job: None,
            reason: None,
            label: None,
            delay_ms: None,
            deadline_ms: None,
        }
    }

    /// Attaches a job name.
    #[inline]
    pub fn with_job(mut self, job: impl Into<Arc<str>>) -> Self {
        self.job = Some(job.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an error label.
    #[inline]
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// Attaches a start delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a deadline (stored as milliseconds).
    #[inline]
    pub fn with_deadline(mut self, d: Duration) -> Self {
        self.deadline_ms = Some(compact_ms(d));
        self
    }

    /// Creates a subscriber overflow event naming the event that was dropped.
    ///
    /// `cause` is `"full"` or `"closed"`.
    pub fn subscriber_overflow(
        subscriber: &'static str,
        dropped: &Event,
        cause: &'static str,
    ) -> Self {
        let kind = dropped.kind.as_label();
        let seq = dropped.seq;
        let reason = match dropped.job.as_deref() {
            Some(job) => format!("{cause}: dropped {kind} of {job:?} (seq {seq})"),
            None => format!("{cause}: dropped {kind} (seq {seq})"),
        };
        Event::new(EventKind::SubscriberOverflow)
            .with_job(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_job(subscriber)
            .with_reason(info)
    }

    /// Checks if this is one of the four terminal job events.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}
