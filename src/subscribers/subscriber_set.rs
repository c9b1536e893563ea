//! # Per-subscriber delivery of job events.
//!
//! ```text
//! emit(event) ── accepts(kind)? ──► [queue] ──► worker ──► on_event()
//!                      │               │full         └──► panic → SubscriberPanicked
//!                      └─ skip         └──► SubscriberOverflow (names the dropped job)
//! ```
//!
//! ## Rules
//! - `emit()` never waits: a full queue drops the event for that subscriber only
//! - each subscriber sees the events it accepts in bus order, so a job's
//!   `JobStarting` always precedes its terminal event
//! - events about subscribers themselves never trigger further overflow or
//!   panic events

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct Worker {
    sub: Arc<dyn Subscribe>,
    queue: mpsc::Sender<Arc<Event>>,
    handle: JoinHandle<()>,
}

impl Worker {
    fn spawn(sub: Arc<dyn Subscribe>, bus: &Bus) -> Self {
        let (queue, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
        let bus = bus.clone();
        let handle = tokio::spawn({
            let sub = Arc::clone(&sub);
            async move {
                while let Some(ev) = rx.recv().await {
                    let delivered = std::panic::AssertUnwindSafe(sub.on_event(&ev))
                        .catch_unwind()
                        .await;
                    let Err(panic) = delivered else { continue };
                    let msg = panic_message(&*panic);
                    if ev.kind.is_subscriber() {
                        tracing::error!(
                            subscriber = sub.name(),
                            %msg,
                            "subscriber panicked on a subscriber report"
                        );
                        continue;
                    }
                    let info = match ev.job.as_deref() {
                        Some(job) => format!("{msg} (on {} of {job:?})", ev.kind.as_label()),
                        None => format!("{msg} (on {})", ev.kind.as_label()),
                    };
                    bus.publish(Event::subscriber_panicked(sub.name(), info));
                }
            }
        });
        Self { sub, queue, handle }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Delivers runner events to subscribers through bounded per-subscriber queues.
pub struct SubscriberSet {
    workers: Vec<Worker>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber. Must be called inside a Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let workers = subs.into_iter().map(|sub| Worker::spawn(sub, &bus)).collect();
        Self { workers, bus }
    }

    /// Queues `event` for every subscriber that accepts its kind.
    pub fn emit(&self, event: Event) {
        let event = Arc::new(event);
        for worker in &self.workers {
            if !worker.sub.accepts(event.kind) {
                continue;
            }
            let cause = match worker.queue.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if event.kind.is_subscriber() {
                tracing::debug!(
                    subscriber = worker.sub.name(),
                    cause,
                    "dropped subscriber report"
                );
            } else {
                self.bus
                    .publish(Event::subscriber_overflow(worker.sub.name(), &event, cause));
            }
        }
    }

    /// Closes every queue and waits until each worker handled its backlog.
    pub async fn shutdown(self) {
        for Worker { queue, handle, .. } in self.workers {
            drop(queue);
            let _ = handle.await;
        }
    }
}
