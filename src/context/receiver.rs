//! Observer side of a job context's result channel.

use tokio::sync::watch;

use crate::error::JobError;

pub(crate) type Outcome = Option<Result<(), JobError>>;

/// Receives the single terminal value reported by a job context.
///
/// Any number of receivers may exist; each observes the same value.
#[derive(Clone)]
pub struct ResultReceiver {
    rx: watch::Receiver<Outcome>,
}

impl ResultReceiver {
    pub(crate) fn new(rx: watch::Receiver<Outcome>) -> Self {
        Self { rx }
    }

    /// Waits for the job result.
    ///
    /// Returns [`JobError::Canceled`] if every handle to the context was dropped
    /// without a result being reported.
    pub async fn recv(&mut self) -> Result<(), JobError> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or(Err(JobError::Canceled)),
            Err(_closed) => Err(JobError::Canceled),
        }
    }

    /// Returns the result if it has already been reported.
    pub fn try_recv(&self) -> Option<Result<(), JobError>> {
        self.rx.borrow().clone()
    }
}
