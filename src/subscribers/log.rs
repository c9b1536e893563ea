//! # LogWriter: forwards job events to `tracing`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG jobvisor: delay scheduled job="sleep" delay_ms=100
//!  INFO jobvisor: job starting job="echo" kind="action"
//!  INFO jobvisor: job finished job="echo"
//!  WARN jobvisor: job failed job="build" label="job_failed" reason="exit status 2"
//!  WARN jobvisor: deadline exceeded job="sleep" deadline_ms=10
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let job = e.job.as_deref().unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::DelayScheduled => {
                tracing::debug!(job, delay_ms = e.delay_ms, "delay scheduled");
            }
            EventKind::JobSkipped => {
                tracing::info!(job, condition = reason, "job skipped");
            }
            EventKind::JobStarting => {
                tracing::info!(job, kind = reason, "job starting");
            }
            EventKind::JobFinished => {
                tracing::info!(job, "job finished");
            }
            EventKind::JobFailed => {
                tracing::warn!(job, label = e.label, reason, "job failed");
            }
            EventKind::JobCanceled => {
                tracing::warn!(job, "job cancelled");
            }
            EventKind::DeadlineHit => {
                tracing::warn!(job, deadline_ms = e.deadline_ms, "deadline exceeded");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(subscriber = job, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(subscriber = job, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;
    use std::time::Duration;
    use tracing_test::traced_test;

    /// Finds the line carrying `message` and checks it holds `level` and every field.
    fn check(lines: &[&str], level: &str, message: &str, fields: &[&str]) -> Result<(), String> {
        let line = lines
            .iter()
            .find(|l| l.contains(message))
            .ok_or_else(|| format!("no line with {message:?}"))?;
        if !line.contains(level) {
            return Err(format!("{message:?} not at {level}: {line}"));
        }
        match fields.iter().find(|f| !line.contains(*f)) {
            Some(missing) => Err(format!("{message:?} lacks {missing:?}: {line}")),
            None => Ok(()),
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_levels_and_fields_per_kind() {
        let writer = LogWriter::new();
        let err = JobError::fail("exit status 2");
        let starting = Event::new(EventKind::JobStarting).with_job("echo");
        let events = [
            Event::new(EventKind::DelayScheduled)
                .with_job("sleep")
                .with_delay(Duration::from_millis(100)),
            Event::new(EventKind::JobSkipped).with_job("lint").with_reason("false"),
            Event::new(EventKind::JobStarting).with_job("echo").with_reason("action"),
            Event::new(EventKind::JobFinished).with_job("echo"),
            Event::new(EventKind::JobFailed)
                .with_job("build")
                .with_reason(err.to_string())
                .with_label(err.as_label()),
            Event::new(EventKind::JobCanceled).with_job("watch"),
            Event::new(EventKind::DeadlineHit)
                .with_job("sleep")
                .with_deadline(Duration::from_millis(10)),
            Event::subscriber_overflow("metrics", &starting, "full"),
            Event::subscriber_panicked("metrics", "boom".into()),
        ];
        for ev in &events {
            writer.on_event(ev).await;
        }

        logs_assert(|lines: &[&str]| {
            check(lines, "DEBUG", "delay scheduled", &["sleep", "delay_ms=100"])?;
            check(lines, "INFO", "job skipped", &["lint", "condition=\"false\""])?;
            check(lines, "INFO", "job starting", &["echo", "kind=\"action\""])?;
            check(lines, "INFO", "job finished", &["echo"])?;
            check(lines, "WARN", "job failed", &["build", "job_failed", "exit status 2"])?;
            check(lines, "WARN", "job cancelled", &["watch"])?;
            check(lines, "WARN", "deadline exceeded", &["sleep", "deadline_ms=10"])?;
            check(lines, "WARN", "subscriber overflow", &["metrics", "dropped job_starting"])?;
            check(lines, "ERROR", "subscriber panicked", &["metrics", "boom"])
        });
    }
}
